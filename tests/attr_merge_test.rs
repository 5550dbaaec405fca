//! Tests for forwarding include attributes onto the fragment root

use std::path::PathBuf;
use tempfile::TempDir;

use htmlstitch::{DiagnosticKind, StitchConfig, Stitcher};

fn create_doc(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).ok();
    }
    std::fs::write(&path, content).expect("write document");
    path
}

fn stitcher() -> Stitcher {
    Stitcher::new(StitchConfig::default()).expect("construct stitcher")
}

#[test]
fn given_class_on_include_when_root_has_class_then_classes_are_joined() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let entry = create_doc(
        &temp,
        "index.html",
        "<include file=\"card.html\" class=\"highlight\"></include>",
    );
    create_doc(&temp, "card.html", "<div class=\"card\">x</div>");

    // Act
    let expansion = stitcher().expand_file(&entry).unwrap();

    // Assert
    assert_eq!(expansion.html, "<div class=\"card highlight\">x</div>");
}

#[test]
fn given_class_on_include_when_root_has_none_then_class_is_set() {
    let temp = TempDir::new().unwrap();
    let entry = create_doc(
        &temp,
        "index.html",
        "<include file=\"card.html\" class=\"only\"></include>",
    );
    create_doc(&temp, "card.html", "<div>x</div>");

    let expansion = stitcher().expand_file(&entry).unwrap();

    assert_eq!(expansion.html, "<div class=\"only\">x</div>");
}

#[test]
fn given_style_on_include_when_root_has_style_then_declarations_are_joined() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let entry = create_doc(
        &temp,
        "index.html",
        "<include file=\"card.html\" style=\"margin: 0\"></include>",
    );
    create_doc(&temp, "card.html", "<div style=\"color: red;\">x</div>");

    // Act
    let expansion = stitcher().expand_file(&entry).unwrap();

    // Assert: separators are normalized to one semicolon per declaration
    assert_eq!(
        expansion.html,
        "<div style=\"color: red; margin: 0;\">x</div>"
    );
}

#[test]
fn given_style_on_include_when_root_has_none_then_style_is_set_with_semicolon() {
    let temp = TempDir::new().unwrap();
    let entry = create_doc(
        &temp,
        "index.html",
        "<include file=\"card.html\" style=\"color: blue\"></include>",
    );
    create_doc(&temp, "card.html", "<div>x</div>");

    let expansion = stitcher().expand_file(&entry).unwrap();

    assert_eq!(expansion.html, "<div style=\"color: blue;\">x</div>");
}

#[test]
fn given_plain_attributes_when_forwarding_then_fragment_value_is_overwritten() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let entry = create_doc(
        &temp,
        "index.html",
        "<include file=\"card.html\" id=\"outer\" data-kind=\"hero\"></include>",
    );
    create_doc(&temp, "card.html", "<div id=\"inner\">x</div>");

    // Act
    let expansion = stitcher().expand_file(&entry).unwrap();

    // Assert
    assert_eq!(
        expansion.html,
        "<div id=\"outer\" data-kind=\"hero\">x</div>"
    );
}

#[test]
fn given_variable_and_file_attributes_when_forwarding_then_they_are_not_copied() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let entry = create_doc(
        &temp,
        "index.html",
        "<include file=\"card.html\" $title=\"T\" id=\"a\"></include>",
    );
    create_doc(&temp, "card.html", "<div>{{ $title }}</div>");

    // Act
    let expansion = stitcher().expand_file(&entry).unwrap();

    // Assert
    assert_eq!(expansion.html, "<div id=\"a\">T</div>");
    assert!(!expansion.html.contains("file="));
    assert!(!expansion.html.contains("$title"));
}

#[test]
fn given_class_when_fragment_has_multiple_roots_then_warning_and_no_merge() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let entry = create_doc(
        &temp,
        "index.html",
        "<include file=\"pair.html\" class=\"x\"></include>",
    );
    create_doc(&temp, "pair.html", "<header>a</header><footer>b</footer>");

    // Act
    let expansion = stitcher().expand_file(&entry).unwrap();

    // Assert: both roots survive untouched and a diagnostic is recorded
    assert_eq!(expansion.html, "<header>a</header><footer>b</footer>");
    assert_eq!(expansion.diagnostics.len(), 1);
    let diag = &expansion.diagnostics[0];
    assert_eq!(diag.kind, DiagnosticKind::AmbiguousAttributeTarget);
    assert_eq!(diag.path, Some(temp.path().join("pair.html")));
    assert!(diag.message.contains("single root element"));
}

#[test]
fn given_style_when_fragment_has_no_element_root_then_warning_and_no_merge() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let entry = create_doc(
        &temp,
        "index.html",
        "<include file=\"text.html\" style=\"color: red\"></include>",
    );
    create_doc(&temp, "text.html", "just text");

    // Act
    let expansion = stitcher().expand_file(&entry).unwrap();

    // Assert
    assert_eq!(expansion.html, "just text");
    assert_eq!(expansion.diagnostics.len(), 1);
    assert_eq!(
        expansion.diagnostics[0].kind,
        DiagnosticKind::AmbiguousAttributeTarget
    );
}

#[test]
fn given_no_class_or_style_when_fragment_has_multiple_roots_then_no_warning() {
    // Arrange: plain attributes are simply dropped for multi-root fragments
    let temp = TempDir::new().unwrap();
    let entry = create_doc(
        &temp,
        "index.html",
        "<include file=\"pair.html\" id=\"z\"></include>",
    );
    create_doc(&temp, "pair.html", "<li>a</li><li>b</li>");

    // Act
    let expansion = stitcher().expand_file(&entry).unwrap();

    // Assert
    assert_eq!(expansion.html, "<li>a</li><li>b</li>");
    assert!(expansion.diagnostics.is_empty());
}

#[test]
fn given_empty_class_value_when_fragment_has_multiple_roots_then_no_warning() {
    let temp = TempDir::new().unwrap();
    let entry = create_doc(
        &temp,
        "index.html",
        "<include file=\"pair.html\" class=\"\"></include>",
    );
    create_doc(&temp, "pair.html", "<li>a</li><li>b</li>");

    let expansion = stitcher().expand_file(&entry).unwrap();

    assert!(expansion.diagnostics.is_empty());
}

#[test]
fn given_comment_next_to_single_root_when_forwarding_then_merge_still_applies() {
    // Arrange: only element roots count for the single-root rule
    let temp = TempDir::new().unwrap();
    let entry = create_doc(
        &temp,
        "index.html",
        "<include file=\"card.html\" class=\"on\"></include>",
    );
    create_doc(&temp, "card.html", "<!-- card --><div class=\"base\">x</div>");

    // Act
    let expansion = stitcher().expand_file(&entry).unwrap();

    // Assert
    assert_eq!(
        expansion.html,
        "<!-- card --><div class=\"base on\">x</div>"
    );
    assert!(expansion.diagnostics.is_empty());
}

#[test]
fn given_interpolated_attribute_value_when_forwarding_then_resolved_value_is_copied() {
    // Arrange: forwarding reads the include tag's literal attributes
    let temp = TempDir::new().unwrap();
    let entry = create_doc(
        &temp,
        "index.html",
        "<include file=\"card.html\" $tone=\"dark\" class=\"tone\"></include>",
    );
    create_doc(&temp, "card.html", "<div class=\"{{ $tone }}\">x</div>");

    // Act
    let expansion = stitcher().expand_file(&entry).unwrap();

    // Assert: the fragment interpolates first, then the class merge appends
    assert_eq!(expansion.html, "<div class=\"dark tone\">x</div>");
}
