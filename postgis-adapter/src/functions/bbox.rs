//! Bounding-box comparisons.

use crate::connection::SpatialConnection;
use crate::errors::SpatialResult;
use crate::sql::BboxOperator;
use crate::subject::AsSubject;

use super::{GeomRef, SpatialCalculation};

macro_rules! bbox_predicates {
    ($($method:ident => $op:ident, $doc:literal;)*) => {
        impl<C: SpatialConnection + ?Sized, S: AsSubject + ?Sized> GeomRef<'_, C, S> {
            $(
                #[doc = $doc]
                pub fn $method<O: AsSubject + ?Sized>(&self, other: &O) -> SpatialResult<bool> {
                    self.bbox(BboxOperator::$op, other)
                }
            )*
        }
    };
}

bbox_predicates! {
    strictly_left_of => StrictlyLeft, "`<<`: this box is strictly left of the other.";
    strictly_right_of => StrictlyRight, "`>>`: this box is strictly right of the other.";
    overlaps_or_left_of => OverlapsOrLeft, "`&<`: this box overlaps or is left of the other.";
    overlaps_or_right_of => OverlapsOrRight, "`&>`: this box overlaps or is right of the other.";
    strictly_below => StrictlyBelow, "`<<|`: this box is strictly below the other.";
    strictly_above => StrictlyAbove, "`|>>`: this box is strictly above the other.";
    overlaps_or_below => OverlapsOrBelow, "`&<|`: this box overlaps or is below the other.";
    overlaps_or_above => OverlapsOrAbove, "`|&>`: this box overlaps or is above the other.";
    same_as => Same, "`=`: both boxes are the same.";
    completely_contained_by => ContainedBy, "`@`: this box is contained by the other.";
    completely_contains => Contains, "`~`: this box contains the other.";
    interacts_with => Interacts, "`&&`: the boxes intersect.";
    binary_equal => BinaryEqual, "`~=`: the geometries are binary equal.";
}

impl<C: SpatialConnection + ?Sized, S: AsSubject + ?Sized> GeomRef<'_, C, S> {
    /// Compares bounding boxes with `operator`.
    pub fn bbox<O: AsSubject + ?Sized>(&self, operator: BboxOperator, other: &O) -> SpatialResult<bool> {
        self.binary(operator, other, Vec::new())?.into_bool()
    }

    /// Compares bounding boxes with an operator given by its SQL token,
    /// e.g. `"&<"`.
    pub fn bbox_token<O: AsSubject + ?Sized>(&self, token: &str, other: &O) -> SpatialResult<bool> {
        self.bbox(token.parse()?, other)
    }

    /// `true` if the bounding boxes intersect.
    pub fn envelopes_intersect<O: AsSubject + ?Sized>(&self, other: &O) -> SpatialResult<bool> {
        self.interacts_with(other)
    }
}
