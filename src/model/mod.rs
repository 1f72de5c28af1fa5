pub mod error;
pub mod question;
pub mod response;

pub use error::QuizError;
pub use question::{Answer, Question, QuestionType};
pub use response::Response;
