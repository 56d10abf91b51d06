use super::driver::{Description, MemberLine, Outcome};
use super::reporter::Reporter;
use rfx_solver::ReflectError;

#[test]
fn renders_inherits_without_color() {
    let reporter = Reporter::new(false);
    let outcome = Outcome::Inherits {
        ty: "List<Int32>".to_string(),
        target: "IEnumerable<T>".to_string(),
        inherits: true,
    };
    assert_eq!(reporter.render(&outcome), "List<Int32> inherits IEnumerable<T>");

    let outcome = Outcome::Inherits {
        ty: "Int32".to_string(),
        target: "IList<T>".to_string(),
        inherits: false,
    };
    assert_eq!(reporter.render(&outcome), "Int32 does not inherit IList<T>");
}

#[test]
fn renders_argument_lists() {
    let reporter = Reporter::new(false);
    let outcome = Outcome::GenericArgs {
        ty: "Dual".to_string(),
        definition: "IEnumerable<T>".to_string(),
        arguments: vec![vec!["Int32".to_string()], vec!["String".to_string()]],
    };
    assert_eq!(
        reporter.render(&outcome),
        "Dual as IEnumerable<T>:\n  <Int32>\n  <String>"
    );
}

#[test]
fn renders_members_and_descriptions() {
    let reporter = Reporter::new(false);
    let outcome = Outcome::Members {
        ty: "Int32".to_string(),
        members: vec![MemberLine {
            kind: "method",
            name: "Parse".to_string(),
            signature: "Int32 Int32.Parse(String)".to_string(),
            visibility: "public".to_string(),
            is_static: true,
            declaring_type: "Int32".to_string(),
        }],
    };
    let text = reporter.render(&outcome);
    assert!(text.starts_with("Int32 (1 members)"));
    assert!(text.contains("public static"));
    assert!(text.contains("Int32 Int32.Parse(String)"));

    let outcome = Outcome::Described(Description {
        name: "Demo.IUnaryDictionary<T>".to_string(),
        kind: Some("Interface".to_string()),
        is_generic_definition: true,
        contains_generic_parameters: true,
        generic_arguments: vec!["?T".to_string()],
        base_type: None,
        interfaces: vec!["IDictionary<T, T>".to_string()],
    });
    let text = reporter.render(&outcome);
    assert!(text.starts_with("Demo.IUnaryDictionary<T> (interface)"));
    assert!(text.contains("generic definition"));
    assert!(text.contains("arguments: ?T"));
    assert!(text.contains("implements IDictionary<T, T>"));
    assert!(!text.contains("base:"));
}

#[test]
fn renders_json_with_query_tag() {
    let reporter = Reporter::new(false);
    let outcome = Outcome::Resolved {
        ty: "IUnaryDictionary<T>".to_string(),
        inherited: "IDictionary<String, String>".to_string(),
        resolved: "IUnaryDictionary<String>".to_string(),
    };
    let json = reporter.render_json(&outcome).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["query"], "resolved");
    assert_eq!(value["resolved"], "IUnaryDictionary<String>");
}

#[test]
fn renders_errors_with_category() {
    let reporter = Reporter::new(false);
    let err = ReflectError::NotRelated {
        ty: "Int32".to_string(),
        target: "IList<T>".to_string(),
    };
    assert_eq!(
        reporter.render_error(&err),
        "error[notfound]: \"Int32\" isn't a \"IList<T>\""
    );
}
