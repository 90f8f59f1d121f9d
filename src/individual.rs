//! Individuals that own alignments.

/// A sequenced individual.
///
/// An individual is identified by its `id` and grouped with other
/// individuals by its `label` (for example, `healthy` or `sepsis`). Both take
/// part in the cache layout, so two alignments with the same ID that belong to
/// different individuals never collide.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Individual {
    /// The identifier.
    id: String,

    /// The group label.
    label: String,
}

impl Individual {
    /// Creates a new [`Individual`].
    ///
    /// # Examples
    ///
    /// ```
    /// use fragcov::Individual;
    ///
    /// let individual = Individual::new("P01", "healthy");
    /// assert_eq!(individual.id(), "P01");
    /// assert_eq!(individual.label(), "healthy");
    /// ```
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
        }
    }

    /// Gets the identifier of the individual.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Gets the group label of the individual.
    pub fn label(&self) -> &str {
        &self.label
    }
}

impl std::fmt::Display for Individual {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.label, self.id)
    }
}
