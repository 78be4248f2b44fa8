//! Show command module
//!
//! Runs a read-only `show` command on the controller and returns its output.
//!
//! ```yaml
//! - name: List APs
//!   aos_show_command:
//!     command: show ap database
//! ```

use async_trait::async_trait;

use super::{Module, ModuleContext, ModuleOutput, ModuleParams, ModuleResult, ParamExt};

/// Message for a command that produced no output
pub const EMPTY_RESPONSE_MESSAGE: &str =
    "Empty response received. Check if a valid show command is given in the playbook.";

/// Module for running show commands
pub struct AosShowCommandModule;

#[async_trait]
impl Module for AosShowCommandModule {
    fn name(&self) -> &'static str {
        "aos_show_command"
    }

    fn description(&self) -> &'static str {
        "Run a show command on an ArubaOS controller"
    }

    fn required_params(&self) -> &[&'static str] {
        &["command"]
    }

    fn validate_params(&self, params: &ModuleParams) -> ModuleResult<()> {
        params.get_string_required("command").map(|_| ())
    }

    async fn execute(
        &self,
        params: &ModuleParams,
        context: &mut ModuleContext,
    ) -> ModuleResult<ModuleOutput> {
        let command = params.get_string_required("command")?;
        let response = context
            .api
            .show_command(&mut context.session, &command)
            .await?;

        let msg = if response.body.is_empty() {
            EMPTY_RESPONSE_MESSAGE
        } else {
            ""
        };
        Ok(ModuleOutput::ok(msg).with_response(&response))
    }
}
