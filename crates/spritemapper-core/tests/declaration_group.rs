use spritemapper_core::css::{CssEvent, Declaration, to_css_string};
use spritemapper_core::group::{DeclarationGroup, MergeOutcome, Pending};
use spritemapper_core::position::BackgroundPosition;
use spritemapper_core::sprite::SpriteRef;

fn sprite(x: i64, y: i64) -> SpriteRef {
    SpriteRef::new("a.png", "site.css", BackgroundPosition::from_pixels(x, y))
}

fn decl(text: &str) -> Declaration {
    Declaration::new(text, 1)
}

#[test]
fn starts_idle_and_passes_positions_through() {
    let mut group = DeclarationGroup::new();
    assert!(!group.is_active());
    let d = decl("background-position: 1px 2px");
    assert_eq!(group.merge_position(d.clone()), MergeOutcome::PassThrough(d));
    let other = CssEvent::Other(" ".into());
    assert_eq!(group.defer(other.clone()), Some(other));
    assert!(group.close().is_none());
}

#[test]
fn merges_longhand_as_old_minus_new() {
    let mut group = DeclarationGroup::new();
    assert!(group.open(decl("background: url('a.png') 10px 20px"), sprite(10, 20)).is_none());
    assert!(group.is_active());
    assert_eq!(
        group.merge_position(decl("background-position: 4px 6px")),
        MergeOutcome::Merged
    );
    let active = group.close().unwrap();
    assert_eq!(active.sprite.declared_position.pixel_offset().unwrap(), (6, 14));
    assert!(active.unsupported.is_none());
    assert!(!group.is_active());
}

#[test]
fn merges_accumulate() {
    let mut group = DeclarationGroup::new();
    group.open(decl("background: url(a.png)"), sprite(0, 0));
    group.merge_position(decl("background-position: 1px 1px"));
    group.merge_position(decl("background-position: 2px 3px"));
    let active = group.active().unwrap();
    assert_eq!(active.sprite.declared_position.pixel_offset().unwrap(), (-3, -4));
}

#[test]
fn non_pixel_longhand_marks_background_unsupported() {
    let mut group = DeclarationGroup::new();
    group.open(decl("background: url(a.png) 10px 20px"), sprite(10, 20));
    let outcome = group.merge_position(decl("background-position: center top"));
    assert!(matches!(outcome, MergeOutcome::Unsupported(_)));
    // later longhands are not merged either
    assert!(matches!(
        group.merge_position(decl("background-position: 1px 1px")),
        MergeOutcome::Unsupported(_)
    ));

    let active = group.close().unwrap();
    assert!(active.unsupported.is_some());
    assert_eq!(active.sprite.declared_position.pixel_offset().unwrap(), (10, 20));
    let text = to_css_string(&active.into_events(None));
    assert_eq!(
        text,
        "background: url(a.png) 10px 20px;background-position: center top;background-position: 1px 1px;"
    );
}

#[test]
fn deferred_events_keep_their_order() {
    let mut group = DeclarationGroup::new();
    group.open(decl("background: url(a.png)"), sprite(0, 0));
    assert!(group.defer(CssEvent::Other(" ".into())).is_none());
    assert!(group.defer(CssEvent::Declaration(decl("color: red"))).is_none());
    let active = group.close().unwrap();
    assert_eq!(active.pending.len(), 2);
    assert_eq!(
        to_css_string(&active.into_events(None)),
        "background: url(a.png); color: red;"
    );
}

#[test]
fn replacement_drops_merged_longhands_and_their_indent() {
    let mut group = DeclarationGroup::new();
    group.open(decl("background: url(a.png) 10px 20px"), sprite(10, 20));
    group.defer(CssEvent::Other("\n  ".into()));
    group.merge_position(decl("background-position: 4px 6px"));
    group.defer(CssEvent::Other("\n".into()));
    let active = group.close().unwrap();
    assert!(matches!(active.pending[1], Pending::Merged(_)));

    let events = active
        .clone()
        .into_events(Some("background: url('sheet.png') no-repeat 6px 14px".into()));
    assert_eq!(
        to_css_string(&events),
        "background: url('sheet.png') no-repeat 6px 14px;\n"
    );
    // without a replacement the longhand is printed as read
    assert_eq!(
        to_css_string(&active.into_events(None)),
        "background: url(a.png) 10px 20px;\n  background-position: 4px 6px;\n"
    );
}

#[test]
fn opening_again_hands_back_the_previous_background() {
    let mut group = DeclarationGroup::new();
    group.open(decl("background: url(a.png)"), sprite(0, 0));
    group.defer(CssEvent::Other(" ".into()));
    let b = SpriteRef::new("b.png", "site.css", BackgroundPosition::default());
    let previous = group.open(decl("background: url(b.png)"), b.clone()).unwrap();
    assert_eq!(previous.sprite.path, std::path::PathBuf::from("a.png"));
    assert_eq!(previous.pending.len(), 1);
    assert_eq!(group.active().unwrap().sprite, b);
}
