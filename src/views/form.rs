use askama::Template;
use axum::response::{Html, IntoResponse};

use crate::submission::schema::{self, Connection, DEFAULT_RATING, RATING_MAX, RATING_MIN};

pub const TITLE: &str = "Evaluate Sabbir!";
pub const DESCRIPTION: &str = "Please provide your feedback on your experience of work with me. \
Your insights are valuable and help me to improve. Please include details about the specific \
project, club, or mentorship you were involved in, and how you came to know me.";

struct ConnectionOption {
    value: &'static str,
    label: &'static str,
}

struct Star {
    value: u8,
    filled: bool,
}

#[derive(Template)]
#[template(path = "evaluation_form.html")]
struct EvaluationFormTemplate {
    title: &'static str,
    description: &'static str,
    connections: Vec<ConnectionOption>,
    stars: Vec<Star>,
    default_rating: u8,
    schema_json: String,
}

pub async fn index() -> impl IntoResponse {
    let template = EvaluationFormTemplate {
        title: TITLE,
        description: DESCRIPTION,
        connections: Connection::ALL
            .iter()
            .map(|c| ConnectionOption {
                value: c.as_str(),
                label: c.label(),
            })
            .collect(),
        stars: (RATING_MIN..=RATING_MAX)
            .map(|value| Star {
                value,
                filled: value <= DEFAULT_RATING,
            })
            .collect(),
        default_rating: DEFAULT_RATING,
        schema_json: schema::descriptor().to_string(),
    };
    Html(template.render().unwrap_or_default())
}
