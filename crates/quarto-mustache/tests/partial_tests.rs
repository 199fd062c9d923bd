/*
 * partial_tests.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Partial expansion and indentation through the public render API.
 */

use pretty_assertions::assert_eq;
use quarto_mustache::{Mustache, Partials, RenderOptions, Value};
use serde_json::json;

async fn render(template: &str, view: Value, partials: Partials) -> String {
    Mustache::new()
        .render(template, view, partials, RenderOptions::new())
        .await
        .unwrap()
}

fn empty() -> Value {
    Value::from(json!({}))
}

#[tokio::test]
async fn test_partial_expands() {
    let out = render("\"{{>text}}\"", empty(), Partials::from([("text", "from partial")])).await;
    assert_eq!(out, "\"from partial\"");
}

#[tokio::test]
async fn test_missing_partial_is_empty() {
    let out = render("\"{{>text}}\"", empty(), Partials::none()).await;
    assert_eq!(out, "\"\"");
}

#[tokio::test]
async fn test_partial_uses_current_context() {
    let out = render(
        "\"{{>partial}}\"",
        Value::from(json!({ "text": "content" })),
        Partials::from([("partial", "*{{text}}*")]),
    )
    .await;
    assert_eq!(out, "\"*content*\"");
}

#[tokio::test]
async fn test_inline_partial_is_not_indented() {
    let out = render(
        "    <div>{{> partial}}</div>",
        empty(),
        Partials::from([("partial", "This is a partial.")]),
    )
    .await;
    assert_eq!(out, "    <div>This is a partial.</div>");
}

#[tokio::test]
async fn test_inline_multiline_partial_aligns_continuation_lines() {
    let out = render(
        "    <div>{{> partial}}</div>",
        empty(),
        Partials::from([("partial", "This is a\npartial.")]),
    )
    .await;
    assert_eq!(out, "    <div>This is a\n         partial.</div>");
}

#[tokio::test]
async fn test_partial_after_leading_whitespace_keeps_first_line() {
    // Not standalone because of the trailing text, so only continuation
    // lines pick up the leading whitespace.
    let out = render("  {{>p}} x", empty(), Partials::from([("p", "a\nb")])).await;
    assert_eq!(out, "  a\n  b x");
}

#[tokio::test]
async fn test_recursive_partial() {
    let view = Value::from(json!({
        "content": "X",
        "nodes": [{ "content": "Y", "nodes": [] }]
    }));
    let out = render(
        "{{>node}}",
        view,
        Partials::from([("node", "{{content}}<{{#nodes}}{{>node}}{{/nodes}}>")]),
    )
    .await;
    assert_eq!(out, "X<Y<>>");
}

#[tokio::test]
async fn test_surrounding_whitespace_is_kept() {
    let out = render("| {{>partial}} |", empty(), Partials::from([("partial", "\t|\t")])).await;
    assert_eq!(out, "| \t|\t |");
}

#[tokio::test]
async fn test_crlf_standalone_partial() {
    let out = render("|\r\n{{>partial}}\r\n|", empty(), Partials::from([("partial", ">")])).await;
    assert_eq!(out, "|\r\n>|");
}

#[tokio::test]
async fn test_standalone_without_preceding_newline() {
    let out = render("  {{>partial}}\n>", empty(), Partials::from([("partial", ">\n>")])).await;
    assert_eq!(out, "  >\n  >>");
}

#[tokio::test]
async fn test_standalone_without_following_newline() {
    let out = render(">\n  {{>partial}}", empty(), Partials::from([("partial", ">\n>")])).await;
    assert_eq!(out, ">\n  >\n  >");
}

#[tokio::test]
async fn test_in_tag_whitespace_is_ignored() {
    let out = render(
        "|{{> partial }}|",
        Value::from(json!({ "boolean": true })),
        Partials::from([("partial", "[]")]),
    )
    .await;
    assert_eq!(out, "|[]|");
}

#[tokio::test]
async fn test_partial_lines_are_indented_before_rendering() {
    let out = render(
        "\\\n {{>partial}}\n/\n",
        Value::from(json!({ "content": "<\n->" })),
        Partials::from([("partial", "|\n{{{content}}}\n|\n")]),
    )
    .await;
    // Interpolated values are not indented.
    assert_eq!(out, "\\\n |\n <\n->\n |\n/\n");
}

#[tokio::test]
async fn test_partial_after_other_tags_is_left_alone() {
    let out = render(
        "  {{data}}  {{> partial}}\n",
        Value::from(json!({ "data": "|" })),
        Partials::from([("partial", ">\n>")]),
    )
    .await;
    assert_eq!(out, "  |  >\n>\n");
}

fn upper_case_view() -> Value {
    Value::map([(
        "toUpperCase",
        Value::section_lambda(|text, _| Value::from(text.to_uppercase())),
    )])
}

#[tokio::test]
async fn test_partial_inherits_lambdas() {
    let partials = || Partials::from([("partial", "aA-{{ #toUpperCase }}Input{{ /toUpperCase }}-Aa")]);

    let out = render("{{> partial }}", upper_case_view(), partials()).await;
    assert_eq!(out, "aA-INPUT-Aa");

    let out = render("  {{> partial }}", upper_case_view(), partials()).await;
    assert_eq!(out, "  aA-INPUT-Aa");
}

#[tokio::test]
async fn test_nested_partials_use_call_tags() {
    let partials = Partials::from([
        ("level1", "partial 1\n[[> level2]]"),
        ("level2", "partial 2\n[[> level3]]"),
        ("level3", "partial 3\n[[> level4]]"),
        ("level4", "partial 4\n[[> level5]]"),
        ("level5", "partial 5"),
    ]);
    let out = Mustache::new()
        .render("[[> level1 ]]", empty(), partials, ["[[", "]]"])
        .await
        .unwrap();
    assert_eq!(out, "partial 1\npartial 2\npartial 3\npartial 4\npartial 5");
}

#[tokio::test]
async fn test_standalone_indent_nests() {
    let partials = Partials::from([("outer", "<\n  {{>inner}}\n>"), ("inner", "a\nb\n")]);
    let out = render("  {{>outer}}\n", empty(), partials).await;
    assert_eq!(out, "  <\n    a\n    b\n  >");
}

#[tokio::test]
async fn test_partials_from_fn() {
    let partials = Partials::from_fn(|name| Some(format!("[{name}:{{{{x}}}}]")));
    let out = render("{{>a}}{{>b}}", Value::map([("x", 1)]), partials).await;
    assert_eq!(out, "[a:1][b:1]");
}
