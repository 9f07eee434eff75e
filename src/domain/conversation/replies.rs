//! Fixed assistant replies.

pub const SUBMITTED: &str = "Thank you! Your information has been sent to an attorney who \
handles cases like yours. You should hear from them shortly.";

pub const ALREADY_SUBMITTED: &str = "Your information has already been submitted. An attorney \
will be in touch soon. If you have a new legal issue, please start a new conversation.";

pub const SUBMISSION_FAILED: &str = "Something went wrong while sending your information. \
Your answers are saved. Reply \"yes\" to try again.";

pub const SUBMISSION_IN_FLIGHT: &str =
    "Your request is already being processed. Please wait a moment.";

pub const DECLINED: &str = "No problem, nothing has been sent. Let me know if anything needs \
to change, or reply \"yes\" whenever you're ready to submit.";

pub const RETRY_PROMPT: &str = "Your previous submission didn't go through. Reply \"yes\" to \
try sending your information again.";

pub const NO_CHANGES: &str = "I didn't catch any changes.";
