//! Project file format.
//!
//! ```json
//! { "formatVersion": 1, "project": { "name": "...", "document": {}, ... } }
//! ```

use crate::state::WorkspaceError;
use serde::{Deserialize, Serialize};
use sitekit_common::CommonResult;
use sitekit_editor::Project;

pub const FORMAT_VERSION: u32 = 1;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ProjectFileRef<'a> {
    format_version: u32,
    project: &'a Project,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Header {
    format_version: u32,
}

#[derive(Deserialize)]
struct ProjectFile {
    project: Project,
}

/// Serialize a project as a pretty-printed project file
pub fn encode(project: &Project) -> CommonResult<String> {
    let file = ProjectFileRef {
        format_version: FORMAT_VERSION,
        project,
    };
    Ok(serde_json::to_string_pretty(&file)?)
}

/// Parse a project file, refusing versions this build does not understand
pub fn decode(text: &str) -> Result<Project, WorkspaceError> {
    let header: Header = serde_json::from_str(text)?;
    if header.format_version != FORMAT_VERSION {
        return Err(WorkspaceError::UnsupportedFormat {
            found: header.format_version,
            expected: FORMAT_VERSION,
        });
    }

    let file: ProjectFile = serde_json::from_str(text)?;
    Ok(file.project)
}
