mod external;

pub use external::{DelegatedSubverb, HandlerProgram};
