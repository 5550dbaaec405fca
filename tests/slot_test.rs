//! Tests for slot and template substitution inside included fragments

use std::path::PathBuf;
use tempfile::TempDir;

use htmlstitch::{StitchConfig, Stitcher};

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
fn given_inner_markup_when_fragment_has_slot_then_markup_fills_default_slot() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let entry = create_doc(
        &temp,
        "index.html",
        "<include file=\"card.html\"><p>Hello</p></include>",
    );
    create_doc(&temp, "card.html", "<div class=\"card\"><slot></slot></div>");

    // Act
    let expansion = stitcher().expand_file(&entry).unwrap();

    // Assert
    assert_eq!(expansion.html, "<div class=\"card\"><p>Hello</p></div>");
}

#[test]
fn given_named_templates_when_fragment_has_named_slots_then_each_fills_its_slot() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let entry = create_doc(
        &temp,
        "index.html",
        concat!(
            "<include file=\"page.html\">",
            "<template slot=\"header\"><h1>Title</h1></template>",
            "<template slot=\"footer\"><small>fine print</small></template>",
            "</include>",
        ),
    );
    create_doc(
        &temp,
        "page.html",
        "<article><slot name=\"header\"></slot><slot name=\"footer\"></slot></article>",
    );

    // Act
    let expansion = stitcher().expand_file(&entry).unwrap();

    // Assert
    assert_eq!(
        expansion.html,
        "<article><h1>Title</h1><small>fine print</small></article>"
    );
}

#[test]
fn given_templates_and_loose_markup_when_expanding_then_loose_markup_is_the_default() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let entry = create_doc(
        &temp,
        "index.html",
        concat!(
            "<include file=\"page.html\">",
            "<template slot=\"aside\"><nav>links</nav></template>",
            "<p>body text</p>",
            "</include>",
        ),
    );
    create_doc(
        &temp,
        "page.html",
        "<main><slot name=\"aside\"></slot><slot></slot></main>",
    );

    // Act
    let expansion = stitcher().expand_file(&entry).unwrap();

    // Assert
    assert_eq!(
        expansion.html,
        "<main><nav>links</nav><p>body text</p></main>"
    );
}

#[test]
fn given_template_named_default_when_loose_markup_also_present_then_template_wins() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let entry = create_doc(
        &temp,
        "index.html",
        concat!(
            "<include file=\"card.html\">",
            "<template slot=\"default\"><b>from template</b></template>",
            "loose text",
            "</include>",
        ),
    );
    create_doc(&temp, "card.html", "<div><slot></slot></div>");

    // Act
    let expansion = stitcher().expand_file(&entry).unwrap();

    // Assert
    assert_eq!(expansion.html, "<div><b>from template</b></div>");
}

#[test]
fn given_unmatched_slot_when_expanding_then_fallback_content_remains() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let entry = create_doc(&temp, "index.html", "<include file=\"card.html\"></include>");
    create_doc(
        &temp,
        "card.html",
        "<div><slot name=\"missing\"><i>fallback</i></slot></div>",
    );

    // Act
    let expansion = stitcher().expand_file(&entry).unwrap();

    // Assert
    assert_eq!(expansion.html, "<div><i>fallback</i></div>");
}

#[test]
fn given_unmatched_slot_without_fallback_when_expanding_then_slot_vanishes() {
    let temp = TempDir::new().unwrap();
    let entry = create_doc(&temp, "index.html", "<include file=\"card.html\"></include>");
    create_doc(&temp, "card.html", "<div>a<slot></slot>b</div>");

    let expansion = stitcher().expand_file(&entry).unwrap();

    assert_eq!(expansion.html, "<div>ab</div>");
}

#[test]
fn given_any_input_when_expanding_then_no_slot_tag_survives() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let entry = create_doc(
        &temp,
        "index.html",
        "<include file=\"card.html\"><span>x</span></include>",
    );
    create_doc(
        &temp,
        "card.html",
        "<div><slot></slot><slot name=\"other\">alt</slot></div>",
    );

    // Act
    let expansion = stitcher().expand_file(&entry).unwrap();

    // Assert
    assert!(!expansion.html.contains("<slot"));
    assert!(!expansion.html.contains("</slot>"));
    assert_eq!(expansion.html, "<div><span>x</span>alt</div>");
}

#[test]
fn given_fragment_that_is_only_a_slot_when_expanding_then_top_level_slot_fills() {
    // Arrange: the slot is a root of the fragment, not nested in an element
    let temp = TempDir::new().unwrap();
    let entry = create_doc(
        &temp,
        "index.html",
        "<include file=\"passthrough.html\"><p>raw</p></include>",
    );
    create_doc(&temp, "passthrough.html", "<slot></slot>");

    // Act
    let expansion = stitcher().expand_file(&entry).unwrap();

    // Assert
    assert_eq!(expansion.html, "<p>raw</p>");
}

#[test]
fn given_whitespace_only_inner_markup_when_expanding_then_slot_fallback_applies() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let entry = create_doc(
        &temp,
        "index.html",
        "<include file=\"card.html\">\n   \n</include>",
    );
    create_doc(&temp, "card.html", "<div><slot>default body</slot></div>");

    // Act
    let expansion = stitcher().expand_file(&entry).unwrap();

    // Assert
    assert_eq!(expansion.html, "<div>default body</div>");
}

#[test]
fn given_template_without_slot_name_when_expanding_then_it_stays_in_default_content() {
    // Arrange: a bare <template> is ordinary markup, not a named slot filler
    let temp = TempDir::new().unwrap();
    let entry = create_doc(
        &temp,
        "index.html",
        "<include file=\"card.html\"><template><b>kept</b></template></include>",
    );
    create_doc(&temp, "card.html", "<div><slot></slot></div>");

    // Act
    let expansion = stitcher().expand_file(&entry).unwrap();

    // Assert
    assert_eq!(
        expansion.html,
        "<div><template><b>kept</b></template></div>"
    );
}

#[test]
fn given_slot_content_with_variables_when_expanding_then_placeholders_resolve() {
    // Arrange: slot filling happens after interpolation of the fragment,
    // and the injected markup came through the include tag verbatim
    let temp = TempDir::new().unwrap();
    let entry = create_doc(
        &temp,
        "index.html",
        "<include file=\"card.html\" $name=\"World\"><p>hi</p></include>",
    );
    create_doc(
        &temp,
        "card.html",
        "<div><h1>{{ $name }}</h1><slot></slot></div>",
    );

    // Act
    let expansion = stitcher().expand_file(&entry).unwrap();

    // Assert
    assert_eq!(expansion.html, "<div><h1>World</h1><p>hi</p></div>");
}

#[test]
fn given_multiple_slots_with_same_name_when_expanding_then_each_receives_the_content() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let entry = create_doc(
        &temp,
        "index.html",
        "<include file=\"twice.html\"><u>dup</u></include>",
    );
    create_doc(&temp, "twice.html", "<div><slot></slot>|<slot></slot></div>");

    // Act
    let expansion = stitcher().expand_file(&entry).unwrap();

    // Assert
    assert_eq!(expansion.html, "<div><u>dup</u>|<u>dup</u></div>");
}
