use super::element::Element;
use nalgebra::Point3;

/// A single atom: an element paired with a Cartesian position in Angstroms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Atom {
    pub element: Element,
    pub position: Point3<f64>,
}

impl Atom {
    pub fn new(element: Element, position: Point3<f64>) -> Self {
        Self { element, position }
    }

    #[inline]
    pub fn symbol(&self) -> &'static str {
        self.element.symbol()
    }

    #[inline]
    pub fn mass(&self) -> f64 {
        self.element.atomic_mass()
    }
}
