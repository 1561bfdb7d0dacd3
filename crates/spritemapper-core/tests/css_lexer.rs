use std::path::{Path, PathBuf};

use spritemapper_core::config::{MappingMode, SpritemapConfig};
use spritemapper_core::css::{CssEvent, Directives, parse_stylesheet, print_css, to_css_string};

const SHEETS: &[&str] = &[
    "",
    "a { color: red; }",
    "a{color:red}",
    "a { color: red }\n",
    "/* head */\n@import url(\"base.css\");\n.x { background: url('a.png') 1px 2px; }\n",
    "@media screen and (min-width: 10px) {\n  .a { background: url(a.png); }\n}\n",
    ".q { content: \"; } {\"; font-family: 'a;b'; }",
    ".c { /* inside */ color: /* mid */ blue; ; }",
    "  \n\t.tab\t{\tmargin : 0 ;\n}\n\n",
    ".u { background: url(data:image/png;base64,AA==) }",
    ".unterminated { color: red",
    "/* never closed",
    "a { b: \"open string }",
];

#[test]
fn printer_reproduces_input_byte_for_byte() {
    for sheet in SHEETS {
        let events = parse_stylesheet(sheet);
        assert_eq!(&to_css_string(&events), sheet);
        let mut buf = Vec::new();
        print_css(&events, &mut buf).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), *sheet);
    }
}

fn declarations(events: &[CssEvent]) -> Vec<(String, usize)> {
    events
        .iter()
        .filter_map(|e| match e {
            CssEvent::Declaration(d) => Some((d.text.clone(), d.line)),
            _ => None,
        })
        .collect()
}

#[test]
fn declarations_carry_text_and_line() {
    let css = "a {\n  color: red;\n  background: url(a.png) 1px 2px;\n}\nb { margin: 0 }\n";
    let events = parse_stylesheet(css);
    assert_eq!(
        declarations(&events),
        vec![
            ("color: red".to_string(), 2),
            ("background: url(a.png) 1px 2px".to_string(), 3),
            ("margin: 0 ".to_string(), 5),
        ]
    );
    let ends = events.iter().filter(|e| **e == CssEvent::BlockEnd).count();
    assert_eq!(ends, 2);
}

#[test]
fn semicolons_inside_urls_and_strings_do_not_split() {
    let css = ".u { background: url(data:image/png;base64,AA==); content: \"a;b\"; }";
    let decls = declarations(&parse_stylesheet(css));
    assert_eq!(decls.len(), 2);
    assert_eq!(decls[0].0, "background: url(data:image/png;base64,AA==)");
    assert_eq!(decls[1].0, "content: \"a;b\"");
}

#[test]
fn at_rules_and_selectors_are_not_declarations() {
    let css = "@charset \"utf-8\";\na:hover { color: red; }";
    let decls = declarations(&parse_stylesheet(css));
    assert_eq!(decls, vec![("color: red".to_string(), 2)]);
}

#[test]
fn unterminated_declaration_keeps_missing_semicolon() {
    let events = parse_stylesheet("a { color: red }");
    let decl = events
        .iter()
        .find_map(|e| match e {
            CssEvent::Declaration(d) => Some(d),
            _ => None,
        })
        .unwrap();
    assert!(!decl.terminated);
    assert_eq!(decl.property().as_deref(), Some("color"));
}

#[test]
fn directives_are_read_from_leading_comments() {
    let css = "/*\n * spritemapper.output_image = ../out/sheet.png\n * spritemapper.base_url = /static\n */\na { }\n/* spritemapper.css_suffix = -late */";
    let directives = Directives::from_events(&parse_stylesheet(css));
    assert_eq!(
        directives.entries,
        vec![
            ("output_image".to_string(), "../out/sheet.png".to_string()),
            ("base_url".to_string(), "/static".to_string()),
        ]
    );

    let cfg = directives.apply_to(&SpritemapConfig::default(), Path::new("css"));
    assert_eq!(cfg.mapping, MappingMode::Fixed);
    assert_eq!(cfg.output_image, Some(PathBuf::from("out/sheet.png")));
    assert_eq!(cfg.base_url.as_deref(), Some("/static"));
    assert_eq!(cfg.css_suffix, "-sprite");
}

#[test]
fn unknown_directives_are_ignored() {
    let css = "/* spritemapper.padding = 9 */\na { }";
    let directives = Directives::from_events(&parse_stylesheet(css));
    assert!(!directives.is_empty());
    let base = SpritemapConfig::default();
    assert_eq!(directives.apply_to(&base, Path::new("")), base);
}
