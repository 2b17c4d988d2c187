//! End-to-end: project file → edit session → project file

use serde_json::json;
use sitekit_common::{FileSystem, MockFileSystem, PageId, RealFileSystem, SectionId};
use sitekit_editor::{
    Catalog, Document, EditSession, EditorConfig, FlushPolicy, Page, Project, SectionOrder,
};
use sitekit_workspace::{run_script, serializer, EditCommand, WorkspaceState};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

fn sample_project() -> Project {
    let footer = SectionId::from("footer");
    let mut project = Project::new("Corner Cafe");
    project.document = Document::from_value(json!({
        "hero": { "title": "Coffee", "colors": { "background": "#222" } },
        "features": { "items": [] }
    }));
    project.order = SectionOrder::from_ids(["hero", "features", "footer"], &footer);
    project.pages.push(Page::new("home", "Home"));
    project.pages.push(Page::new("menu", "Menu"));
    project.active_page = Some(PageId::from("home"));
    project
}

fn open_session(state: &Arc<WorkspaceState>) -> EditSession {
    let session = EditSession::new(
        "test",
        EditorConfig::default(),
        Arc::new(Catalog::standard()),
        state.clone(),
        state.clone(),
        state.structure(),
    );
    session.add_mirror(state.clone());
    session
}

fn write_project(fs: &dyn FileSystem, path: &Path, project: &Project) {
    let text = serializer::encode(project).unwrap();
    fs.write(path, &text).unwrap();
}

#[test]
fn test_script_round_trip_through_mock_fs() {
    let fs = Arc::new(MockFileSystem::new());
    let path = Path::new("/sites/cafe/project.json");
    write_project(fs.as_ref(), path, &sample_project());

    let state = Arc::new(WorkspaceState::load(fs.clone(), path).unwrap());
    let mut session = open_session(&state);

    let commands: Vec<EditCommand> = serde_json::from_value(json!([
        { "op": "set", "path": "hero.title", "value": "Coffee & Cake" },
        { "op": "add", "section": "pricing" },
        { "op": "reorder", "source": "pricing", "target": "hero" },
        { "op": "toggle", "section": "features" },
        { "op": "add", "section": "footer" },
        { "op": "set", "path": "hero.title.text", "value": "nope" }
    ]))
    .unwrap();

    let report = run_script(&mut session, &commands).unwrap();
    assert_eq!(report.applied, 4);
    assert_eq!(report.skipped.iter().map(|(i, _)| *i).collect::<Vec<_>>(), vec![4, 5]);

    session.close(FlushPolicy::Flush);
    assert!(state.save().unwrap());

    let reloaded = WorkspaceState::load(fs, path).unwrap().project();
    let home = reloaded.page(&PageId::from("home")).unwrap();
    let order: Vec<String> = home.sections.iter().map(|id| id.to_string()).collect();

    assert_eq!(order, vec!["pricing", "hero", "features", "footer"]);
    assert!(!reloaded.visibility.is_visible("features"));
    assert_eq!(reloaded.document.get("hero.title"), Some(&json!("Coffee & Cake")));
    assert_eq!(reloaded.document.get("pricing.variant"), Some(&json!("cards")));
    assert!(home.section_data.contains_key(&SectionId::from("pricing")));
}

#[test]
fn test_page_switch_edits_the_other_page() {
    let fs = Arc::new(MockFileSystem::new());
    let path = Path::new("/p.json");
    write_project(fs.as_ref(), path, &sample_project());

    let state = Arc::new(WorkspaceState::load(fs, path).unwrap());
    let mut session = open_session(&state);

    session
        .switch_page(&PageId::from("menu"), FlushPolicy::Discard)
        .unwrap();
    session.remove_section("features").unwrap();
    session.set("hero.title", json!("Menu")).unwrap();
    session.close(FlushPolicy::Flush);

    let project = state.project();
    let menu = project.page(&PageId::from("menu")).unwrap();
    let home = project.page(&PageId::from("home")).unwrap();

    assert!(!menu.sections.contains("features"));
    assert_eq!(menu.section_data[&SectionId::from("hero")]["title"], json!("Menu"));
    assert!(home.sections.is_empty());
    assert!(home.section_data.is_empty());
    assert_eq!(project.active_page, Some(PageId::from("menu")));
}

#[test]
fn test_real_disk_save_and_reload() -> anyhow::Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("nested").join("project.json");
    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    write_project(fs.as_ref(), &path, &sample_project());

    let state = Arc::new(WorkspaceState::load(fs.clone(), &path)?);
    let mut session = open_session(&state);
    session.set("features.items.0.title", json!("Espresso"))?;
    session.close(FlushPolicy::Flush);
    state.save()?;

    let text = std::fs::read_to_string(&path)?;
    let value: serde_json::Value = serde_json::from_str(&text)?;
    assert_eq!(value["formatVersion"], json!(1));
    assert_eq!(
        value["project"]["document"]["features"]["items"][0]["title"],
        json!("Espresso")
    );
    assert_eq!(
        value["project"]["pages"][0]["sectionData"]["features"],
        json!({ "items": [{ "title": "Espresso" }] })
    );
    Ok(())
}

#[test]
fn test_newer_format_version_is_refused() {
    let fs = Arc::new(MockFileSystem::new());
    fs.add_file(
        "/future.json".into(),
        json!({ "formatVersion": 7, "project": { "name": "Later" } }).to_string(),
    );

    let err = match WorkspaceState::load(fs, "/future.json") {
        Ok(_) => panic!("format version 7 should be refused"),
        Err(err) => err,
    };
    assert!(err.to_string().contains("version 7"));
}
