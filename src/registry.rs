//! Publishing to the npm registry through the `npm` command line.

use serde_json::Value;

use crate::config::NpmOptions;
use crate::error::{GitReleaseError, Result};
use crate::shell::{Access, Shell};
use crate::warning::ReleaseWarning;

const REGISTRY_URL: &str = "https://www.npmjs.com";

/// Asks for a one-time password when the registry requires one
pub type OtpCallback<'a> = &'a dyn Fn() -> Result<String>;

fn is_otp_error(output: &str) -> bool {
    output.contains("EOTP") || output.contains("one-time pass")
}

pub struct NpmClient {
    options: NpmOptions,
    shell: Shell,
    is_published: bool,
}

impl NpmClient {
    pub fn new(options: NpmOptions, shell: Shell) -> Self {
        NpmClient {
            options,
            shell,
            is_published: false,
        }
    }

    pub fn options(&self) -> &NpmOptions {
        &self.options
    }

    /// Dist-tag to publish under: the configured tag, else `next` for
    /// pre-releases and `latest` otherwise
    pub fn tag(&self, is_pre_release: bool) -> String {
        match &self.options.tag {
            Some(tag) if !tag.is_empty() => tag.clone(),
            _ if is_pre_release => "next".to_string(),
            _ => "latest".to_string(),
        }
    }

    /// Publish the package.
    ///
    /// When the registry asks for a one-time password and `otp_callback` is
    /// given, the publish is retried once with the password it returns.
    pub fn publish(&mut self, is_pre_release: bool, otp_callback: Option<OtpCallback>) -> Result<()> {
        if self.options.private {
            let name = self.options.name.clone().unwrap_or_default();
            self.shell
                .logger()
                .warning(&ReleaseWarning::PrivatePackage { name });
            return Ok(());
        }

        let mut args = vec![
            "publish".to_string(),
            self.options.publish_path.clone(),
            "--tag".to_string(),
            self.tag(is_pre_release),
        ];
        if let Some(access) = self.options.access.as_ref().filter(|a| !a.is_empty()) {
            args.push("--access".to_string());
            args.push(access.clone());
        }

        let mut with_otp = args.clone();
        if let Some(otp) = self.options.otp.as_ref().filter(|o| !o.is_empty()) {
            with_otp.push("--otp".to_string());
            with_otp.push(otp.clone());
        }

        match self.shell.exec("npm", &with_otp, Access::Write) {
            Ok(_) => {}
            Err(GitReleaseError::Command { output, .. }) if is_otp_error(&output) => {
                let Some(callback) = otp_callback else {
                    return Err(GitReleaseError::command(
                        "npm publish",
                        "a one-time password is required",
                    ));
                };
                let otp = callback()?;
                args.push("--otp".to_string());
                args.push(otp);
                self.shell.exec("npm", &args, Access::Write)?;
            }
            Err(e) => return Err(e),
        }

        self.is_published = true;
        Ok(())
    }

    pub fn package_url(&self) -> Option<String> {
        self.options
            .name
            .as_ref()
            .map(|name| format!("{}/package/{}", REGISTRY_URL, name))
    }

    pub fn is_published(&self) -> bool {
        self.is_published
    }

    /// Public options for hook templates
    pub fn snapshot(&self) -> Result<Value> {
        Ok(serde_json::to_value(&self.options)?)
    }
}
