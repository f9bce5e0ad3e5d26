use derive_more::{
    Add, AddAssign, Deref, DerefMut, Display, Div, DivAssign, From, Into, Mul, MulAssign, Neg, Sub,
    SubAssign, Sum,
};

/// A length in PDF points (1/72 of an inch), the unit of PDF user space.
///
/// Pages built from images use one point per image pixel, so image-space
/// coordinates convert to points without scaling.
#[derive(
    Debug,
    Default,
    Copy,
    Clone,
    PartialEq,
    PartialOrd,
    Add,
    AddAssign,
    Sub,
    SubAssign,
    Mul,
    MulAssign,
    Div,
    DivAssign,
    Neg,
    Sum,
    Deref,
    DerefMut,
    From,
    Into,
    Display,
)]
pub struct Pt(pub f32);

impl Pt {
    /// The absolute value of this length
    pub fn abs(self) -> Pt {
        Pt(self.0.abs())
    }
}

impl From<i32> for Pt {
    fn from(v: i32) -> Self {
        Pt(v as f32)
    }
}

impl From<u32> for Pt {
    fn from(v: u32) -> Self {
        Pt(v as f32)
    }
}
