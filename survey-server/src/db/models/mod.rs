//! 数据模型
//!
//! 引擎消费的存储实体：Restaurant → DiningTable → ScanCode → Assignment，
//! 以及独立的 Questionnaire 和不可变的 Response。

pub mod serde_helpers;

pub mod assignment;
pub mod dining_table;
pub mod questionnaire;
pub mod response;
pub mod restaurant;
pub mod scan_code;

pub use assignment::{Assignment, AssignmentCreate};
pub use dining_table::{DiningTable, DiningTableCreate};
pub use questionnaire::{
    ChoiceOption, Question, QuestionKind, Questionnaire, QuestionnaireCreate, QuestionnaireUpdate,
};
pub use response::Response;
pub use restaurant::{Restaurant, RestaurantCreate};
pub use scan_code::ScanCode;
