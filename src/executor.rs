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

use std::fmt;
use std::future::Future;
use std::process::Stdio;

use anyhow::{anyhow, bail, Context};
use tokio::process::Command;
use tracing::{error, info, warn};

use crate::images::CommandLine;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandInvocation {
    pub program: String,
    pub args: Vec<String>,
}

impl TryFrom<&CommandLine> for CommandInvocation {
    type Error = anyhow::Error;

    fn try_from(command: &CommandLine) -> Result<Self, Self::Error> {
        let (program, args) = command.split_first().ok_or_else(|| anyhow!("empty command"))?;
        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }
}

impl fmt::Display for CommandInvocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Runs a single command to completion.
pub trait Runner {
    fn run(&self, command: &CommandInvocation) -> impl Future<Output = anyhow::Result<()>> + Send;
}

/// Spawns real child processes that share this process's stdout and stderr.
#[derive(Debug, Default)]
pub struct ProcessRunner;

impl Runner for ProcessRunner {
    async fn run(&self, command: &CommandInvocation) -> anyhow::Result<()> {
        let status = Command::new(&command.program)
            .args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await
            .with_context(|| format!("cannot run `{command}`"))?;

        if !status.success() {
            bail!("`{command}` failed: {status}");
        }

        Ok(())
    }
}

/// Runs `commands` one after another. A failing command is logged and the
/// next one still runs.
pub async fn exec_hook<R: Runner>(runner: &R, image: &str, tag: &str, commands: &[CommandLine]) {
    info!("Executing hook for image {image}:{tag}");

    let mut failed = 0;
    for command in commands {
        let result = match CommandInvocation::try_from(command) {
            Ok(invocation) => runner.run(&invocation).await,
            Err(err) => Err(err),
        };

        if let Err(err) = result {
            error!("Error while executing hook for {image}:{tag}: {err:#}");
            failed += 1;
        }
    }

    if failed > 0 {
        warn!("{failed} of {} commands failed for {image}:{tag}", commands.len());
    }
}
