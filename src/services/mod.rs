pub mod eligibility;
pub mod paper_service;
pub mod replacement;
pub mod selection;
pub mod synthesis;

pub use eligibility::{Demand, Eligibility, EligibilityValidator};
pub use paper_service::{LayoutChoice, PaperService};
pub use replacement::ReplacementResolver;
pub use selection::SelectionEngine;
pub use synthesis::{LlmSynthesis, SynthesisService};
