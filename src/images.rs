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

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// One command line: token 0 is the executable, the rest are its arguments.
pub type CommandLine = Vec<String>;

#[allow(clippy::module_name_repetitions)]
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ImageConfig {
    /// `namespace/name` of the watched repository
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub hook: String,
    #[serde(default)]
    pub tags: HashMap<String, Vec<CommandLine>>,
}

/// All configured images, in load order. Never mutated after startup.
#[derive(Clone, Debug, Default)]
pub struct Images(Vec<ImageConfig>);

impl Images {
    pub fn new(images: Vec<ImageConfig>) -> Self {
        Self(images)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ImageConfig> {
        self.0.iter()
    }

    /// Finds the commands for an exact image and tag match. Entries are scanned
    /// in load order and the first one carrying both wins.
    pub fn commands(&self, image: &str, tag: &str) -> Option<&[CommandLine]> {
        self.0
            .iter()
            .filter(|config| config.image == image)
            .find_map(|config| config.tags.get(tag))
            .map(Vec::as_slice)
    }
}
