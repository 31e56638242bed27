use std::fs;
use std::path::{Path, PathBuf};

use mdhtml_core::{Document, Options};

#[test]
fn golden_fixtures() -> Result<(), Box<dyn std::error::Error>> {
    let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests");
    let fixtures_dir = root.join("fixtures");
    let expect_dir = root.join("expect");

    let mut fixtures = collect_fixtures(&fixtures_dir)?;
    fixtures.sort();
    assert!(!fixtures.is_empty(), "no fixtures found in {:?}", fixtures_dir);

    for fixture in fixtures {
        let name = fixture
            .file_stem()
            .and_then(|stem| stem.to_str())
            .ok_or("fixture name is not valid UTF-8")?
            .to_string();
        let source = fs::read_to_string(&fixture)?;
        let mut doc = Document::new(Options::default());
        doc.read(&source)?;
        let html = doc.to_html();

        let expected = fs::read_to_string(expect_dir.join(format!("{}.html", name)))?;
        assert_eq!(
            html.trim_end(),
            expected.trim_end(),
            "HTML mismatch for fixture {}",
            name
        );
    }

    Ok(())
}

fn collect_fixtures(dir: &Path) -> Result<Vec<PathBuf>, Box<dyn std::error::Error>> {
    let mut fixtures = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().and_then(|ext| ext.to_str()) == Some("md") {
            fixtures.push(path);
        }
    }
    Ok(fixtures)
}
