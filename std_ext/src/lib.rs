use std::sync::Arc;

use easy_ext::ext;

#[ext(ArcExt)]
pub impl<T: ?Sized> Arc<T> {
    /// Clones the pointer without the ambiguity of `Clone::clone` in code
    /// that also clones pointees.
    #[must_use]
    fn clone_arc(&self) -> Self {
        Self::clone(self)
    }
}
