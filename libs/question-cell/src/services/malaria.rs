use crate::models::{CreateQuestionRequest, QuestionType};

pub const MALARIA: &str = "Malaria";

fn question(
    step_number: u32,
    field_name: &str,
    title: &str,
    question_type: QuestionType,
    options: &[&str],
) -> CreateQuestionRequest {
    CreateQuestionRequest {
        disease: MALARIA.to_string(),
        title: title.to_string(),
        description: None,
        question_type,
        options: options.iter().map(|o| o.to_string()).collect(),
        step_number,
        field_name: field_name.to_string(),
        is_active: Some(true),
        is_required: Some(true),
    }
}

/// The default malaria screening questionnaire, in step order.
pub fn questionnaire() -> Vec<CreateQuestionRequest> {
    let yes_no = ["Yes", "No"];

    let mut feeling = question(
        4,
        "currentFeeling",
        "How are you feeling right now?",
        QuestionType::MultipleChoice,
        &[
            "Fever",
            "Headache",
            "Body weakness",
            "Chills",
            "Sweating",
            "Nausea",
            "Vomiting",
            "Other",
        ],
    );
    feeling.description = Some("Select one or select other and type it".to_string());

    let mut medications = question(
        7,
        "medicationsTaken",
        "What medications have you taken for these symptoms?",
        QuestionType::MultipleChoice,
        &[
            "Paracetamol",
            "Antimalarial drugs",
            "Antibiotics",
            "Herbal remedies",
            "None",
            "Other",
        ],
    );
    medications.description = Some("Select all that apply or type others".to_string());
    medications.is_required = Some(false);

    vec![
        question(1, "hasMalaria", "Do you think you have malaria?", QuestionType::YesNo, &yes_no),
        question(
            2,
            "patientName",
            "Hi! I'm here to help you check how you're feeling today. Before we begin, what name should I call you?",
            QuestionType::Text,
            &[],
        ),
        question(3, "age", "How old are you?", QuestionType::Text, &[]),
        feeling,
        question(
            5,
            "symptomOnset",
            "When did these symptoms start?",
            QuestionType::MultipleChoice,
            &["Today", "1-2 days ago", "3-5 days ago", "More than 5 days"],
        ),
        question(
            6,
            "travelHistory",
            "Have you travelled recently to an area with high malaria cases?",
            QuestionType::YesNo,
            &yes_no,
        ),
        medications,
    ]
}
