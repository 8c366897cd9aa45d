use std::fmt;

/// A named slot that extensions register under.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Namespace(&'static str);

impl Namespace {
    /// Top-level commands.
    pub const VERB: Namespace = Namespace("colcon_core.verb");
    /// Second-level commands of the `acceleration` verb.
    pub const SUBVERB: Namespace = Namespace("colcon_hardware_acceleration.subverb");

    pub const fn new(id: &'static str) -> Self {
        Self(id)
    }

    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}
