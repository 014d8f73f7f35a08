pub mod engine;
pub mod session;

use std::fs::File;
use std::io::{BufReader, Read};

use crate::error::BankError;

/// One multiple-choice question. `correct` is an index into `options`; the
/// bank validates it at load time, so it is always in bounds afterwards.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct QuizQuestion {
    pub prompt: String,
    pub options: Vec<String>,
    pub correct: usize,
}

/// The ordered list of questions every quiz walks through. Loaded once at
/// startup and read-only from then on.
pub struct QuestionBank {
    questions: Vec<QuizQuestion>,
}

impl QuestionBank {
    pub fn new(questions: Vec<QuizQuestion>) -> Result<Self, BankError> {
        if questions.is_empty() {
            return Err(BankError::Empty);
        }
        for (i, question) in questions.iter().enumerate() {
            if question.correct >= question.options.len() {
                return Err(BankError::BadCorrectIndex {
                    question: i,
                    correct: question.correct,
                    options: question.options.len(),
                });
            }
        }
        Ok(Self { questions })
    }

    pub fn load(reader: impl Read) -> Result<Self, BankError> {
        let questions: Vec<QuizQuestion> = serde_json::from_reader(reader)?;
        Self::new(questions)
    }

    pub fn load_path(path: &str) -> Result<Self, BankError> {
        let file = File::open(path)?;
        Self::load(BufReader::new(file))
    }

    pub fn get(&self, index: usize) -> Option<&QuizQuestion> {
        self.questions.get(index)
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}
