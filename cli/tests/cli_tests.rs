//! CLI binary integration tests using assert_cmd + predicates.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn cmd() -> Command {
    Command::cargo_bin("oas-preprocess").expect("binary should exist")
}

fn petstore() -> String {
    serde_json::json!({
        "openapi": "3.0.3",
        "info": { "title": "Pets", "version": "1" },
        "paths": {
            "/pets": {
                "get": {
                    "responses": {
                        "200": {
                            "description": "ok",
                            "content": { "application/json": {
                                "schema": { "$ref": "#/components/schemas/Pet" }
                            } }
                        }
                    }
                }
            }
        },
        "components": { "schemas": {
            "Pet": {
                "type": "object",
                "required": ["id", "name"],
                "properties": {
                    "id": { "type": "string", "readOnly": true },
                    "name": { "type": "string" },
                    "born": { "type": "string", "format": "date" }
                }
            },
            "Animal": {
                "oneOf": [
                    { "$ref": "#/components/schemas/Cat" },
                    { "$ref": "#/components/schemas/Dog" }
                ],
                "discriminator": { "propertyName": "kind", "mapping": { "cat": "#/components/schemas/Cat" } }
            },
            "Cat": { "type": "object" },
            "Dog": { "type": "object" }
        } }
    })
    .to_string()
}

fn write_input(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

fn read_json(path: &PathBuf) -> serde_json::Value {
    let content = fs::read_to_string(path).expect("output file should exist");
    serde_json::from_str(&content).expect("output should be valid JSON")
}

// ── Preprocess ──────────────────────────────────────────────────────────────

#[test]
fn test_preprocess_to_stdout() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "api.json", &petstore());

    cmd()
        .args(["preprocess", input.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"_discriminator\""));
}

#[test]
fn test_preprocess_writes_request_and_response_documents() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "api.json", &petstore());
    let request = dir.path().join("request.json");
    let response = dir.path().join("response.json");

    cmd()
        .args(["preprocess", input.to_str().unwrap()])
        .args(["-o", request.to_str().unwrap()])
        .args(["--response-output", response.to_str().unwrap()])
        .assert()
        .success();

    let request = read_json(&request);
    let response = read_json(&response);
    assert_eq!(
        request["components"]["schemas"]["Pet"]["required"],
        serde_json::json!(["name"])
    );
    assert_eq!(
        response["components"]["schemas"]["Pet"]["required"],
        serde_json::json!(["id", "name"])
    );
    assert_eq!(
        response["components"]["schemas"]["Pet"]["properties"]["born"]["x-serializer"],
        serde_json::json!({ "format": "date" })
    );
}

#[test]
fn test_preprocess_reads_yaml() {
    let dir = TempDir::new().unwrap();
    let yaml = "
openapi: 3.0.3
paths: {}
components:
  schemas:
    Pet:
      type: object
      required: [id]
      properties:
        id: { type: string, readOnly: true }
";
    let input = write_input(&dir, "api.yaml", yaml);

    cmd()
        .args(["preprocess", input.to_str().unwrap(), "--format", "compact"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"Pet\":{\"type\":\"object\",\"properties\""));
}

#[test]
fn test_duplicate_options_reject_fails() {
    let dir = TempDir::new().unwrap();
    let document = serde_json::json!({
        "openapi": "3.0.3",
        "paths": {},
        "components": { "schemas": {
            "Animal": {
                "oneOf": [
                    { "$ref": "#/components/schemas/Cat" },
                    { "$ref": "#/components/schemas/Dog" }
                ],
                "discriminator": { "propertyName": "kind", "mapping": { "Dog": "#/components/schemas/Cat" } }
            },
            "Cat": { "type": "object" },
            "Dog": { "type": "object" }
        } }
    });
    let input = write_input(&dir, "api.json", &document.to_string());

    cmd()
        .args(["preprocess", input.to_str().unwrap()])
        .args(["--duplicate-options", "reject"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Preprocessing failed"))
        .stderr(predicate::str::contains(
            "{\"code\":\"duplicate_discriminator_option\",",
        ))
        .stderr(predicate::str::contains("\"path\":\"#/components/schemas/Animal\""));

    cmd()
        .args(["preprocess", input.to_str().unwrap()])
        .assert()
        .success();
}

// ── Discriminators ──────────────────────────────────────────────────────────

#[test]
fn test_discriminators_lists_compiled_options() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "api.json", &petstore());

    let output = cmd()
        .args(["discriminators", input.to_str().unwrap()])
        .output()
        .unwrap();
    assert!(output.status.success());

    let listing: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(
        listing["/components/schemas/Animal"],
        serde_json::json!({
            "property": "kind",
            "options": [
                { "option": "cat", "ref": "Cat" },
                { "option": "Dog", "ref": "Dog" }
            ],
            "compiled": ["Dog", "cat"]
        })
    );
}

// ── Errors ──────────────────────────────────────────────────────────────────

#[test]
fn test_missing_input_file_fails() {
    cmd()
        .args(["preprocess", "/nonexistent/api.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load document"))
        .stderr(predicate::str::contains("\"code\":\"document_load_error\""));
}

#[test]
fn test_invalid_json_input_fails() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "bad.json", "not json");

    cmd()
        .args(["preprocess", input.to_str().unwrap()])
        .assert()
        .failure();
}

#[test]
fn test_unknown_draft_is_rejected() {
    cmd()
        .args(["preprocess", "api.json", "--draft", "draft7"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}
