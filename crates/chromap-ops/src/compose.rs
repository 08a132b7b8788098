//! Whole-image composition graphs.
//!
//! A [`Graph`] is a small DAG of per-pixel primitives over RGBA images:
//! arithmetic (`Multiply`, `Divide`, `Add`, `Subtract`), `Gamma`, `Clip`,
//! `Luminance` and `Density`, fed by named inputs and constant colors.
//! Nodes get ids in insertion order and may only reference existing nodes,
//! so every graph is acyclic and evaluating in id order is a valid
//! topological order.
//!
//! Arithmetic applies to RGB; alpha is taken from the first operand.
//! Constants broadcast against images.
//!
//! [`exposure_map`] builds the stock graph that carries the color of an
//! "old" reference exposure over to the luminance of a "new" image, scaling
//! chroma by the change in image density:
//!
//! ```text
//! f2n            = Y(white) / white
//! scale_exposure = Y(new) / Y(old)
//! scale_contrast = (density(Y(new)) / density(Y(old)))^gamma
//! result         = ((old * f2n * scale_exposure - Y(new)) * scale_contrast + Y(new)) / f2n
//! ```

use std::collections::HashMap;

use chromap_core::{luminance, luminance_plane, ColorImage, NeutralReference};
use serde::{Deserialize, Serialize};
#[allow(unused_imports)]
use tracing::{debug, trace};

use crate::gradient::image_density;
use crate::{OpsError, OpsResult};

/// Default chroma-scale gamma of [`exposure_map`].
pub const DEFAULT_CHROMA_SCALE_GAMMA: f32 = 0.4545;

/// Valid range of [`ExposureMapParams::chroma_scale_gamma`].
pub const CHROMA_SCALE_GAMMA_RANGE: (f32, f32) = (0.1, 3.0);

/// Index of a node within its [`Graph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Position in insertion order.
    #[inline]
    pub fn index(&self) -> usize {
        self.0
    }
}

/// A graph primitive.
#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    /// Image supplied at evaluation time under this name.
    Input(String),
    /// Constant RGBA color.
    Constant([f32; 4]),
    /// `a * b`.
    Multiply(NodeId, NodeId),
    /// `a / b`, 0 where `b` is 0.
    Divide(NodeId, NodeId),
    /// `a + b`.
    Add(NodeId, NodeId),
    /// `a - b`.
    Subtract(NodeId, NodeId),
    /// `a^value`; negative bases give 0.
    Gamma(NodeId, f32),
    /// Clamps RGB into `[lo, hi]`.
    Clip(NodeId, f32, f32),
    /// Rec.709 luminance broadcast to RGB.
    Luminance(NodeId),
    /// Image density of the luminance, broadcast to RGB.
    Density(NodeId),
}

impl Op {
    fn operands(&self) -> Vec<NodeId> {
        match *self {
            Op::Input(_) | Op::Constant(_) => Vec::new(),
            Op::Multiply(a, b) | Op::Divide(a, b) | Op::Add(a, b) | Op::Subtract(a, b) => {
                vec![a, b]
            }
            Op::Gamma(a, _) | Op::Clip(a, _, _) | Op::Luminance(a) | Op::Density(a) => vec![a],
        }
    }
}

/// Intermediate result: an image or a color that broadcasts.
#[derive(Debug, Clone)]
enum Value {
    Image(ColorImage),
    Color([f32; 4]),
}

/// A composition DAG.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    nodes: Vec<Op>,
}

impl Graph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the graph has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Adds a node and returns its id.
    ///
    /// # Errors
    ///
    /// [`OpsError::Graph`] if an operand does not exist yet.
    pub fn add(&mut self, op: Op) -> OpsResult<NodeId> {
        let id = NodeId(self.nodes.len());
        if let Some(bad) = op.operands().into_iter().find(|o| o.0 >= id.0) {
            return Err(OpsError::Graph(format!(
                "node {} references missing node {}",
                id.0, bad.0
            )));
        }
        self.nodes.push(op);
        Ok(id)
    }

    /// Adds a named input.
    pub fn input(&mut self, name: impl Into<String>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Op::Input(name.into()));
        id
    }

    /// Adds a constant color.
    pub fn constant(&mut self, color: [f32; 4]) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Op::Constant(color));
        id
    }

    /// Evaluates `output` with the given named inputs.
    ///
    /// A constant result is broadcast over the extent of the first input
    /// node.
    ///
    /// # Errors
    ///
    /// [`OpsError::Graph`] for unknown ids, missing inputs or images of
    /// different extents; errors of the density filter are passed through.
    pub fn evaluate(&self, output: NodeId, inputs: &HashMap<&str, &ColorImage>) -> OpsResult<ColorImage> {
        if output.0 >= self.nodes.len() {
            return Err(OpsError::Graph(format!("unknown output node {}", output.0)));
        }

        // Only nodes that feed `output` are computed.
        let mut needed = vec![false; output.0 + 1];
        needed[output.0] = true;
        for i in (0..=output.0).rev() {
            if needed[i] {
                for o in self.nodes[i].operands() {
                    needed[o.0] = true;
                }
            }
        }
        trace!(
            nodes = self.nodes.len(),
            needed = needed.iter().filter(|&&n| n).count(),
            "evaluate graph"
        );

        let mut values: Vec<Option<Value>> = vec![None; output.0 + 1];
        for i in 0..=output.0 {
            if !needed[i] {
                continue;
            }
            let value = self.eval_node(&self.nodes[i], &values, inputs)?;
            values[i] = Some(value);
        }

        match values[output.0].take() {
            Some(Value::Image(img)) => Ok(img),
            Some(Value::Color(color)) => {
                let extent = self.nodes.iter().find_map(|op| match op {
                    Op::Input(name) => inputs.get(name.as_str()),
                    _ => None,
                });
                match extent {
                    Some(img) => Ok(ColorImage::filled(img.bounds(), color)),
                    None => Err(OpsError::Graph(
                        "constant output without an input to take its extent from".into(),
                    )),
                }
            }
            None => Err(OpsError::Graph(format!("node {} was not evaluated", output.0))),
        }
    }

    fn eval_node(
        &self,
        op: &Op,
        values: &[Option<Value>],
        inputs: &HashMap<&str, &ColorImage>,
    ) -> OpsResult<Value> {
        let get = |id: NodeId| -> OpsResult<&Value> {
            values
                .get(id.0)
                .and_then(Option::as_ref)
                .ok_or_else(|| OpsError::Graph(format!("node {} has no value", id.0)))
        };

        match op {
            Op::Input(name) => inputs
                .get(name.as_str())
                .map(|img| Value::Image((*img).clone()))
                .ok_or_else(|| OpsError::Graph(format!("missing input '{name}'"))),
            Op::Constant(color) => Ok(Value::Color(*color)),
            Op::Multiply(a, b) => zip(get(*a)?, get(*b)?, |x, y| x * y),
            Op::Divide(a, b) => zip(get(*a)?, get(*b)?, |x, y| if y == 0.0 { 0.0 } else { x / y }),
            Op::Add(a, b) => zip(get(*a)?, get(*b)?, |x, y| x + y),
            Op::Subtract(a, b) => zip(get(*a)?, get(*b)?, |x, y| x - y),
            Op::Gamma(a, value) => {
                let value = *value;
                Ok(map_rgb(get(*a)?, |x| if x > 0.0 { x.powf(value) } else { 0.0 }))
            }
            Op::Clip(a, lo, hi) => {
                let (lo, hi) = (*lo, *hi);
                Ok(map_rgb(get(*a)?, |x| x.clamp(lo, hi)))
            }
            Op::Luminance(a) => Ok(map_pixel(get(*a)?, |[r, g, b, alpha]| {
                let y = luminance([r, g, b]);
                [y, y, y, alpha]
            })),
            Op::Density(a) => density(get(*a)?),
        }
    }
}

fn map_pixel<F>(value: &Value, f: F) -> Value
where
    F: Fn([f32; 4]) -> [f32; 4],
{
    match value {
        Value::Color(c) => Value::Color(f(*c)),
        Value::Image(img) => Value::Image(img.map_channels(f)),
    }
}

fn map_rgb<F>(value: &Value, f: F) -> Value
where
    F: Fn(f32) -> f32,
{
    map_pixel(value, |[r, g, b, a]| [f(r), f(g), f(b), a])
}

fn zip<F>(a: &Value, b: &Value, f: F) -> OpsResult<Value>
where
    F: Fn(f32, f32) -> f32,
{
    let pixel = |p: [f32; 4], q: [f32; 4]| [f(p[0], q[0]), f(p[1], q[1]), f(p[2], q[2]), p[3]];
    match (a, b) {
        (Value::Color(p), Value::Color(q)) => Ok(Value::Color(pixel(*p, *q))),
        (Value::Image(img), Value::Color(q)) => Ok(Value::Image(img.map_channels(|p| pixel(p, *q)))),
        (Value::Color(p), Value::Image(img)) => Ok(Value::Image(img.map_channels(|q| pixel(*p, q)))),
        (Value::Image(x), Value::Image(y)) => {
            if x.bounds() != y.bounds() || x.window() != y.window() {
                return Err(OpsError::Graph(format!(
                    "operand extents differ: {} vs {}",
                    x.window(),
                    y.window()
                )));
            }
            let mut out = x.clone();
            for (p, q) in out.data_mut().chunks_exact_mut(4).zip(y.data().chunks_exact(4)) {
                let r = pixel([p[0], p[1], p[2], p[3]], [q[0], q[1], q[2], q[3]]);
                p.copy_from_slice(&r);
            }
            Ok(Value::Image(out))
        }
    }
}

fn density(value: &Value) -> OpsResult<Value> {
    let img = match value {
        // A flat field has no gradient anywhere.
        Value::Color(c) => return Ok(Value::Color([1.0, 1.0, 1.0, c[3]])),
        Value::Image(img) => img,
    };
    if img.window() != img.bounds() {
        return Err(OpsError::Graph(format!(
            "density needs a whole image, got window {} of {}",
            img.window(),
            img.bounds()
        )));
    }
    let luma = luminance_plane(img);
    let dens = image_density(&luma, luma.window())?;
    let mut out = img.clone();
    for (px, &d) in out.data_mut().chunks_exact_mut(4).zip(dens.data()) {
        px[0] = d;
        px[1] = d;
        px[2] = d;
    }
    Ok(Value::Image(out))
}

macro_rules! binary_builder {
    ($($(#[$doc:meta])* $name:ident => $op:ident;)*) => {
        impl Graph {
            $(
                $(#[$doc])*
                ///
                /// # Errors
                ///
                /// [`OpsError::Graph`] if an operand does not exist.
                pub fn $name(&mut self, a: NodeId, b: NodeId) -> OpsResult<NodeId> {
                    self.add(Op::$op(a, b))
                }
            )*
        }
    };
}

binary_builder! {
    /// Adds `a * b`.
    multiply => Multiply;
    /// Adds `a / b`.
    divide => Divide;
    /// Adds `a + b`.
    add_images => Add;
    /// Adds `a - b`.
    subtract => Subtract;
}

impl Graph {
    /// Adds `a^value`.
    ///
    /// # Errors
    ///
    /// [`OpsError::Graph`] if `a` does not exist.
    pub fn gamma(&mut self, a: NodeId, value: f32) -> OpsResult<NodeId> {
        self.add(Op::Gamma(a, value))
    }

    /// Adds an RGB clamp to `[lo, hi]`.
    ///
    /// # Errors
    ///
    /// [`OpsError::Graph`] if `a` does not exist.
    pub fn clip(&mut self, a: NodeId, lo: f32, hi: f32) -> OpsResult<NodeId> {
        self.add(Op::Clip(a, lo, hi))
    }

    /// Adds the luminance of `a`.
    ///
    /// # Errors
    ///
    /// [`OpsError::Graph`] if `a` does not exist.
    pub fn luminance(&mut self, a: NodeId) -> OpsResult<NodeId> {
        self.add(Op::Luminance(a))
    }

    /// Adds the image density of `a`.
    ///
    /// # Errors
    ///
    /// [`OpsError::Graph`] if `a` does not exist.
    pub fn density(&mut self, a: NodeId) -> OpsResult<NodeId> {
        self.add(Op::Density(a))
    }
}

/// Parameters of [`exposure_map`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExposureMapParams {
    /// Exponent on the density ratio, in [0.1, 3.0]. Around 0.4545 for
    /// color-to-gray results, up to 1.0 for a stronger effect.
    pub chroma_scale_gamma: f32,
    /// Color that counts as white in the reference.
    pub white: NeutralReference,
}

impl Default for ExposureMapParams {
    fn default() -> Self {
        Self {
            chroma_scale_gamma: DEFAULT_CHROMA_SCALE_GAMMA,
            white: NeutralReference::white(),
        }
    }
}

impl ExposureMapParams {
    /// Checks the gamma range.
    ///
    /// # Errors
    ///
    /// [`OpsError::InvalidParameter`] when out of range.
    pub fn validate(&self) -> OpsResult<()> {
        let (lo, hi) = CHROMA_SCALE_GAMMA_RANGE;
        let g = self.chroma_scale_gamma;
        if g.is_finite() && (lo..=hi).contains(&g) {
            Ok(())
        } else {
            Err(OpsError::InvalidParameter(format!(
                "chroma_scale_gamma = {g} outside [{lo}, {hi}]"
            )))
        }
    }
}

/// Builds the exposure-map graph; returns it with its output node.
///
/// Inputs are named `"new"` and `"old"`.
///
/// # Errors
///
/// Only on internal wiring mistakes, which would be [`OpsError::Graph`].
pub fn exposure_map_graph(params: &ExposureMapParams) -> OpsResult<(Graph, NodeId)> {
    let mut g = Graph::new();
    let new = g.input("new");
    let old = g.input("old");

    // White balance
    let white = g.constant(params.white.color());
    let y_white = g.luminance(white)?;
    let factor2neutral = g.divide(y_white, white)?;
    let old_wb = g.multiply(old, factor2neutral)?;

    let y_new = g.luminance(new)?;
    let y_old = g.luminance(old)?;
    let scale_exposure = g.divide(y_new, y_old)?;

    let d_new = g.density(y_new)?;
    let d_old = g.density(y_old)?;
    let density_ratio = g.divide(d_new, d_old)?;
    let scale_contrast = g.gamma(density_ratio, params.chroma_scale_gamma)?;

    let new_unc = g.multiply(old_wb, scale_exposure)?;
    let color_new = g.subtract(new_unc, y_new)?;
    let color_comp = g.multiply(color_new, scale_contrast)?;
    let new_comp = g.add_images(color_comp, y_new)?;
    let result = g.divide(new_comp, factor2neutral)?;

    Ok((g, result))
}

/// Carries the color of `old` over to the luminance of `new`.
///
/// # Errors
///
/// - [`OpsError::InvalidParameter`] for an out-of-range gamma
/// - [`OpsError::Graph`] if the images differ in extent or are not whole
pub fn exposure_map(new: &ColorImage, old: &ColorImage, params: &ExposureMapParams) -> OpsResult<ColorImage> {
    params.validate()?;
    let (graph, output) = exposure_map_graph(params)?;
    debug!(nodes = graph.len(), bounds = %new.bounds(), "exposure_map");
    let inputs = HashMap::from([("new", new), ("old", old)]);
    graph.evaluate(output, &inputs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use chromap_core::Rect;

    fn ramp(w: u32, h: u32, tint: [f32; 3]) -> ColorImage {
        let mut img = ColorImage::new(Rect::from_size(w, h));
        for (x, y) in Rect::from_size(w, h).iter_coords() {
            let v = 0.1 + 0.05 * (x + 2 * y) as f32;
            img.set_pixel(x, y, [v * tint[0], v * tint[1], v * tint[2], 1.0]);
        }
        img
    }

    #[test]
    fn test_dangling_reference_rejected() {
        let mut g = Graph::new();
        let a = g.input("a");
        assert!(matches!(g.multiply(a, NodeId(5)), Err(OpsError::Graph(_))));
        // Self reference is impossible too
        assert!(g.add(Op::Luminance(NodeId(1))).is_err());
        assert_eq!(g.len(), 1);
    }

    #[test]
    fn test_divide_by_zero_is_zero() {
        let mut g = Graph::new();
        let a = g.input("a");
        let zero = g.constant([0.0, 2.0, 0.0, 1.0]);
        let q = g.divide(a, zero).unwrap();
        let img = ColorImage::filled(Rect::from_size(2, 2), [1.0, 1.0, 1.0, 0.5]);
        let out = g.evaluate(q, &HashMap::from([("a", &img)])).unwrap();
        assert_eq!(out.pixel(1, 1), [0.0, 0.5, 0.0, 0.5]);
    }

    #[test]
    fn test_gamma_and_clip() {
        let mut g = Graph::new();
        let a = g.input("a");
        let sq = g.gamma(a, 2.0).unwrap();
        let clipped = g.clip(sq, 0.0, 0.5).unwrap();
        let img = ColorImage::filled(Rect::from_size(1, 1), [-0.5, 0.5, 0.9, 1.0]);
        let inputs = HashMap::from([("a", &img)]);
        assert_eq!(g.evaluate(sq, &inputs).unwrap().pixel(0, 0), [0.0, 0.25, 0.9f32.powf(2.0), 1.0]);
        assert_eq!(g.evaluate(clipped, &inputs).unwrap().pixel(0, 0), [0.0, 0.25, 0.5, 1.0]);
    }

    #[test]
    fn test_alpha_from_first_operand() {
        let mut g = Graph::new();
        let a = g.input("a");
        let b = g.input("b");
        let sum = g.add_images(b, a).unwrap();
        let ia = ColorImage::filled(Rect::from_size(2, 1), [0.1, 0.1, 0.1, 0.2]);
        let ib = ColorImage::filled(Rect::from_size(2, 1), [0.3, 0.3, 0.3, 0.9]);
        let out = g.evaluate(sum, &HashMap::from([("a", &ia), ("b", &ib)])).unwrap();
        assert_eq!(out.pixel(0, 0)[3], 0.9);
    }

    #[test]
    fn test_missing_input_and_extent_mismatch() {
        let mut g = Graph::new();
        let a = g.input("a");
        let b = g.input("b");
        let p = g.multiply(a, b).unwrap();
        let small = ColorImage::from_size(2, 2);
        let large = ColorImage::from_size(3, 2);
        assert!(matches!(
            g.evaluate(p, &HashMap::from([("a", &small)])),
            Err(OpsError::Graph(_))
        ));
        assert!(matches!(
            g.evaluate(p, &HashMap::from([("a", &small), ("b", &large)])),
            Err(OpsError::Graph(_))
        ));
    }

    #[test]
    fn test_unused_nodes_not_evaluated() {
        let mut g = Graph::new();
        let a = g.input("a");
        let _unused = g.input("never supplied");
        let y = g.luminance(a).unwrap();
        let img = ColorImage::filled(Rect::from_size(2, 2), [1.0, 0.0, 0.0, 1.0]);
        let out = g.evaluate(y, &HashMap::from([("a", &img)])).unwrap();
        assert_eq!(out.pixel(0, 0)[1], chromap_core::REC709_LUMA_R);
    }

    #[test]
    fn test_constant_output_takes_input_extent() {
        let mut g = Graph::new();
        g.input("a");
        let c = g.constant([0.25, 0.5, 0.75, 1.0]);
        let img = ColorImage::from_size(3, 2);
        let out = g.evaluate(c, &HashMap::from([("a", &img)])).unwrap();
        assert_eq!(out.bounds(), img.bounds());
        assert_eq!(out.pixel(2, 1), [0.25, 0.5, 0.75, 1.0]);
    }

    #[test]
    fn test_exposure_map_same_image_is_identity() {
        let img = ramp(6, 5, [1.0, 0.7, 0.4]);
        let out = exposure_map(&img, &img, &ExposureMapParams::default()).unwrap();
        for (x, y, px) in img.pixels() {
            let got = out.pixel(x, y);
            for c in 0..4 {
                assert_abs_diff_eq!(got[c], px[c], epsilon = 1e-5);
            }
        }
    }

    #[test]
    fn test_exposure_map_follows_new_luminance() {
        // Flat images: density ratio is 1, so the result is old's chroma on new's luminance
        let old = ColorImage::filled(Rect::from_size(4, 4), [0.6, 0.3, 0.2, 1.0]);
        let new = ColorImage::filled(Rect::from_size(4, 4), [0.5, 0.5, 0.5, 1.0]);
        let out = exposure_map(&new, &old, &ExposureMapParams::default()).unwrap();
        let px = out.pixel(2, 2);
        assert_abs_diff_eq!(luminance([px[0], px[1], px[2]]), 0.5, epsilon = 1e-5);
        assert!(px[0] > px[1] && px[1] > px[2]);
        assert_abs_diff_eq!(px[0] / px[2], 3.0, epsilon = 1e-4);
    }

    #[test]
    fn test_exposure_map_params() {
        let bad = ExposureMapParams {
            chroma_scale_gamma: 0.05,
            ..Default::default()
        };
        let img = ColorImage::from_size(2, 2);
        assert!(matches!(
            exposure_map(&img, &img, &bad),
            Err(OpsError::InvalidParameter(_))
        ));
        let p: ExposureMapParams = serde_yaml::from_str("chroma_scale_gamma: 1.0").unwrap();
        assert_eq!(p.white, NeutralReference::white());
    }
}
