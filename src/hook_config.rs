// Copyright 2024 SAP SE
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::fs;
use std::path::Path;

use anyhow::Context;
use serde_json::Value;

use crate::images::{ImageConfig, Images};
use crate::util;

/// Reads the hook configuration at `path`. YAML is used for `.yaml` and `.yml`
/// files, JSON for everything else.
pub fn load(path: &Path) -> Result<Images, anyhow::Error> {
    let content = fs::read(path).with_context(|| format!("cannot read configuration file {}", path.display()))?;
    parse(&content, is_yaml(path)).with_context(|| format!("cannot parse configuration file {}", path.display()))
}

fn parse(content: &[u8], yaml: bool) -> Result<Images, anyhow::Error> {
    let records: Option<Vec<Value>> = if yaml {
        serde_yml::from_slice(content)?
    } else {
        serde_json::from_slice(content)?
    };

    // a bare `null` document loads as an empty list
    let mut images = Vec::new();
    for (index, record) in records.unwrap_or_default().into_iter().enumerate() {
        let image: Option<ImageConfig> =
            util::from_object(record).with_context(|| format!("invalid image entry #{index}"))?;
        images.push(image.unwrap_or_default());
    }

    Ok(Images::new(images))
}

fn is_yaml(path: &Path) -> bool {
    path.extension()
        .and_then(|extension| extension.to_str())
        .is_some_and(|extension| extension.eq_ignore_ascii_case("yaml") || extension.eq_ignore_ascii_case("yml"))
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::path::Path;

    use tempfile::NamedTempFile;

    use super::{is_yaml, load, parse};

    fn config_file(suffix: &str, content: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn loads_json() {
        let file = config_file(
            ".json",
            r#"[{"image":"a/b","hook":"h","tags":{"latest":[["echo","x"]],"dev":[["true"],["ls","-l","/"]]}}]"#,
        );

        let images = load(file.path()).unwrap();
        let image = images.iter().next().unwrap();
        assert_eq!(image.image, "a/b");
        assert_eq!(image.hook, "h");
        assert_eq!(image.tags.len(), 2);
        assert_eq!(images.commands("a/b", "dev").unwrap()[1], ["ls", "-l", "/"]);
    }

    #[test]
    fn loads_yaml() {
        let file = config_file(
            ".yaml",
            "- image: a/b\n  hook: h\n  tags:\n    latest:\n      - [echo, x]\n",
        );

        let images = load(file.path()).unwrap();
        assert_eq!(images.commands("a/b", "latest").unwrap()[0], ["echo", "x"]);
    }

    #[test]
    fn missing_fields_are_zero_values() {
        let images = parse(br#"[{"image":"a/b"}]"#, false).unwrap();
        let image = images.iter().next().unwrap();
        assert_eq!(image.hook, "");
        assert!(image.tags.is_empty());
    }

    #[test]
    fn entries_must_be_objects() {
        for content in [r#"[["a/b","h",{}]]"#, r#"[{"image":"a/b","hook":"h"},"a/c"]"#, "[1]"] {
            let err = parse(content.as_bytes(), false).unwrap_err();
            assert!(format!("{err:#}").contains("expected a JSON object"), "{content}: {err:#}");
        }

        let err = parse(b"- [a/b, h, {}]\n", true).unwrap_err();
        assert!(format!("{err:#}").contains("invalid image entry #0"), "{err:#}");
    }

    #[test]
    fn null_document_is_empty() {
        assert_eq!(parse(b"null", false).unwrap().iter().count(), 0);
    }

    #[test]
    fn malformed_content_fails() {
        assert!(parse(b"{\"image\":\"a/b\"}", false).is_err());
        assert!(parse(b"[{\"image\":\"a/b\",\"tags\":{\"latest\":\"echo\"}}]", false).is_err());
        assert!(parse(b"not json", false).is_err());
    }

    #[test]
    fn unreadable_file_fails() {
        let err = load(Path::new("/nonexistent/hooks.json")).unwrap_err();
        assert!(format!("{err:#}").contains("cannot read configuration file /nonexistent/hooks.json"));
    }

    #[test]
    fn yaml_detection() {
        assert!(is_yaml(Path::new("hooks.yaml")));
        assert!(is_yaml(Path::new("hooks.YML")));
        assert!(!is_yaml(Path::new("hooks.json")));
        assert!(!is_yaml(Path::new("hooks")));
    }
}
