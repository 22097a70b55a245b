pub mod format;
pub mod paper;
pub mod question;

pub use format::{PaperFormat, QuestionSlot, Section, SubSlot};
pub use paper::{
    AssignedQuestion, CompositeInstance, GeneratedPaper, LayoutRef, SectionAssignment,
    SlotAddress, SlotAssignment,
};
pub use question::{PoolFilter, Question};
