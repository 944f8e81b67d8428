//! Application layer: Controllers for the client workflows.
//!
//! Controllers are plain state machines. They never perform I/O themselves;
//! they hand out tickets for requests and accept the outcomes back, dropping
//! any outcome whose ticket has been superseded.

mod patient_detail;
mod search;
mod sequence;
mod upload;

pub use patient_detail::{DetailTicket, PatientDetailLoader, PatientLoadError};
pub use search::{SearchController, SearchTicket, MIN_QUERY_CHARS};
pub use sequence::RequestSequence;
pub use upload::{
    SubmissionTicket, SubmitRejected, UploadController, UploadState, DEFAULT_SETTLE_DELAY,
    IN_FLIGHT_PROGRESS_CAP, NO_FILE_MESSAGE,
};
