//! CLI argument parsing and command helper tests.

use std::io::Write;

use clap::Parser;
use eduflow_cli::{
    cli::{Cli, Commands, ListArgs, NamedCommands, StudentArgs, StudentCommands},
    commands::{
        list_query,
        questions::load_question,
        students::{create_form, update_request},
    },
};
use eduflow_frontend::ListQuery;
use eduflow_shared::Role;
use tempfile::NamedTempFile;

#[test]
fn parses_student_list_with_search() {
    let cli = Cli::try_parse_from([
        "eduflow-cli",
        "--api-base",
        "https://edu.example/api",
        "--token",
        "abc",
        "students",
        "list",
        "--page",
        "2",
        "--search",
        "ali vali",
    ])
    .expect("parse");

    assert_eq!(cli.client_config().api_base, "https://edu.example/api");
    let session = cli.session();
    assert!(session.is_authenticated);
    assert_eq!(session.roles, vec![Role::Admin]);
    let Commands::Students {
        action: StudentCommands::List(args),
    } = cli.command
    else {
        panic!("expected students list");
    };
    assert_eq!(list_query(&args, 10), ListQuery::page(2, 10).with_search("alivali"));
}

#[test]
fn list_without_page_fetches_everything() {
    let query = list_query(&ListArgs::default(), 10);
    assert_eq!(query, ListQuery::default());
}

#[test]
fn blank_token_means_anonymous() {
    let cli = Cli::try_parse_from(["eduflow-cli", "--token", "  ", "groups", "list"]).expect("parse");
    assert!(!cli.session().is_authenticated);
}

#[test]
fn parses_exam_category_update() {
    let cli = Cli::try_parse_from([
        "eduflow-cli",
        "exam-categories",
        "update",
        "3",
        "--name",
        "Matematika",
    ])
    .expect("parse");

    match cli.command {
        Commands::ExamCategories {
            action: NamedCommands::Update {
                id,
                name,
            },
        } => {
            assert_eq!(id, 3);
            assert_eq!(name, "Matematika");
        },
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn create_form_accepts_plain_phone_digits() {
    let fields = StudentArgs {
        first_name: Some("Vali".to_string()),
        phone: Some("+998937654321".to_string()),
        password: Some("secret".to_string()),
        ..StudentArgs::default()
    };
    let body = create_form(&fields).to_create(None).expect("valid");
    assert_eq!(body.phone_number.as_deref(), Some("+998937654321"));
    assert_eq!(body.password.as_deref(), Some("secret"));
}

#[test]
fn update_request_carries_only_given_fields() {
    let fields = StudentArgs {
        group_id: Some(4),
        ..StudentArgs::default()
    };
    let body = update_request(&fields, None).expect("valid");
    let json = serde_json::to_value(&body).expect("json");
    assert_eq!(json, serde_json::json!({"group_id": 4, "role": "student"}));
}

#[test]
fn question_file_is_validated() {
    let mut file = NamedTempFile::new().expect("create temp file");
    file.write_all(
        br#"{"question":"2 + 2 = ?","category_id":1,"answers":[{"content":"4","isCorrect":true},{"content":"5","isCorrect":false}]}"#,
    )
    .expect("write question");
    file.flush().expect("flush question");

    let input = load_question(file.path()).expect("valid question");
    assert_eq!(input.answers.len(), 2);

    let mut bad = NamedTempFile::new().expect("create temp file");
    bad.write_all(br#"{"question":"?","answers":[{"content":"4","isCorrect":false}]}"#)
        .expect("write question");
    bad.flush().expect("flush question");
    assert!(load_question(bad.path()).is_err());
}
