//! Component seam.
//!
//! Components contribute renderable assets without being files on disk.
//! Every method has a default, so a component only implements what it has.

/// An icon contributed by a component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Icon {
    pub id: String,
    pub svg: String,
}

impl Icon {
    pub fn new(id: impl Into<String>, svg: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            svg: svg.into(),
        }
    }
}

/// Something that can render CSS, JavaScript, HTML or icons into the bundles.
pub trait Component: Send + Sync {
    /// Name used for the virtual identities of this component's content.
    fn name(&self) -> &str;

    fn css(&self) -> Option<String> {
        None
    }

    fn js(&self) -> Option<String> {
        None
    }

    fn html(&self) -> Option<String> {
        None
    }

    fn icons(&self) -> Vec<Icon> {
        Vec::new()
    }
}
