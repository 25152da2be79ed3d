//! Declared output schemas for structured LLM responses.
//!
//! Each LLM call names the JSON shape it expects back. The schemas are plain
//! JSON Schema objects built with `serde_json::json!` and sent as the
//! `response_format` of the chat request; the response is then deserialized
//! into the matching Rust type.

use crate::extractors::aspects::AspectSpec;
use serde::Serialize;
use serde_json::{Map, Value, json};

/// A named JSON Schema for one kind of structured response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputSchema {
    pub name: String,
    pub schema: Value,
}

fn string_prop(description: &str) -> Value {
    json!({ "type": "string", "description": description })
}

fn nullable_string_prop(description: &str) -> Value {
    json!({ "type": ["string", "null"], "description": description })
}

/// Schema for [`Article`](crate::models::Article) metadata.
pub fn article_schema() -> OutputSchema {
    OutputSchema {
        name: "news-article".to_string(),
        schema: json!({
            "type": "object",
            "properties": {
                "title": string_prop("The title of the news article"),
                "url": string_prop("The URL of the news article"),
                "body": string_prop("The body of the news article"),
                "author": nullable_string_prop("The author of the news article"),
                "date": nullable_string_prop("The date the news article was published"),
            },
            "required": ["title", "url"],
        }),
    }
}

/// Schema for one aspect: an array of issues plus an optional conclusion.
pub fn aspect_schema(spec: &AspectSpec) -> OutputSchema {
    let noun = spec.issue_noun;

    let mut properties = Map::new();
    properties.insert(
        "title".to_string(),
        string_prop(&format!("The title of the {}", noun)),
    );
    if spec.carries_claim {
        properties.insert("claim".to_string(), string_prop("The claim being made"));
    }
    let source_description = "Name of the source or link title";
    properties.insert(
        "source".to_string(),
        if spec.carries_claim {
            nullable_string_prop(source_description)
        } else {
            string_prop(source_description)
        },
    );
    properties.insert(
        "sourceUrl".to_string(),
        nullable_string_prop("Markdown url of the source"),
    );
    properties.insert(
        "description".to_string(),
        string_prop(&format!("A description of the {}", noun)),
    );

    let mut issue_required = vec!["title"];
    if spec.carries_claim {
        issue_required.push("claim");
    } else {
        issue_required.push("source");
    }
    issue_required.push("description");

    let issue = json!({
        "type": "object",
        "properties": properties,
        "required": issue_required,
    });

    let array_type = if spec.nullable_issues {
        json!(["array", "null"])
    } else {
        json!("array")
    };

    let mut top = Map::new();
    top.insert(
        spec.field.to_string(),
        json!({
            "type": array_type,
            "items": issue,
            "description": spec.collection_description,
        }),
    );
    top.insert(
        "conclusion".to_string(),
        nullable_string_prop(&spec.conclusion_description()),
    );

    let mut schema = json!({
        "type": "object",
        "properties": top,
    });
    if !spec.nullable_issues {
        schema["required"] = json!([spec.field]);
    }

    OutputSchema {
        name: spec.schema_name.to_string(),
        schema,
    }
}

/// Schema for [`TrustResult`](crate::models::TrustResult).
pub fn trust_schema() -> OutputSchema {
    OutputSchema {
        name: "news-article-trust-level".to_string(),
        schema: json!({
            "type": "object",
            "properties": {
                "trustLevel": {
                    "type": "string",
                    "enum": ["High", "Medium", "Low", "Unknown"],
                    "description": "The trust level of the article",
                },
                "trustDescription": nullable_string_prop("The description of the trust level"),
            },
            "required": ["trustLevel"],
        }),
    }
}
