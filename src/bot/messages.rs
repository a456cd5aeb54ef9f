// Keyforge - User-facing texts

use crate::store::PackageId;

pub const STATUS_OK: &str = "OK";

pub const GENERATING: &str = "⏳ Generating keystore...";
pub const REUSING: &str = "♻️ Re-issuing the certificate for the existing key...";
pub const CONVERTING: &str = "⏳ Reading the uploaded keystore...";
pub const SENDING: &str = "📤 Sending files...";

pub const CHOICE_REPROMPT: &str =
    "Please reply 1 or \"старый\" (reuse the existing key), 2 or \"новый\" (generate a new one).";

pub const PREVIOUS_FILES_MISSING: &str =
    "⚠️ The previous keystore files were not found, so a new key was generated instead.";

pub const EMPTY_REQUEST: &str = "Send a package name, for example com.example.app";

pub fn help(default_alias: &str, default_password: &str) -> String {
    format!(
        "🔐 Keystore bot\n\
         \n\
         Send a package name to get a new keystore and its certificate:\n\
         com.example.app\n\
         \n\
         Alias and password can follow on the next two lines:\n\
         com.example.app\n\
         my_alias\n\
         my_password\n\
         \n\
         Defaults: alias {}, password {}\n\
         \n\
         Send a .jks or .keystore file to export its certificate as PEM. \
         Put the alias and password in the caption, one per line.\n\
         \n\
         /status checks that the bot is running.",
        default_alias, default_password
    )
}

pub fn choice_prompt(package: &PackageId) -> String {
    format!(
        "📦 A keystore for {} already exists.\n\
         \n\
         1 (старый) - reuse the existing key (new certificate, same private key)\n\
         2 (новый) - archive it and generate a new key",
        package
    )
}
