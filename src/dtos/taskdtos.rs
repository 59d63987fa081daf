use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::taskmodel::TaskCompletion;

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct DailyPostDto {
    #[validate(url(message = "Tweet URL must be a valid URL"))]
    pub tweet_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CompletionResponseDto {
    pub status: String,
    pub message: String,
    pub balance: i64,
    pub data: TaskCompletion,
}

#[derive(Debug, Serialize)]
pub struct CompletionListResponseDto {
    pub status: String,
    pub results: usize,
    pub completions: Vec<TaskCompletion>,
}
