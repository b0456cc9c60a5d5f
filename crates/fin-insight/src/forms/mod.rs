//! Form state and the adapters that turn it into request payloads.

pub mod loan;
pub mod numeric;
pub mod segment;
pub mod state;

pub use loan::{loan_form, Education, LoanPayload, SelfEmployment, CIBIL_FLOOR, LOAN_FIELDS};
pub use segment::{segment_form, SegmentPayload, SEGMENT_FIELDS};
pub use state::{keep_digits, FieldKind, FieldSpec, FormError, FormState};
