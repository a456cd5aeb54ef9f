// Keyforge - Fake tool runner for tests
//
// Emulates the handful of keytool/openssl commands the pipeline uses with a
// plain-text stand-in keystore, and records every invocation.

use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use super::runner::{ToolInvocation, ToolOutput, ToolRunner};
use super::ToolError;

const MAGIC: &str = "FAKE-KEYSTORE";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockBehavior {
    Normal,
    /// Every invocation fails as if the binary were not installed.
    MissingTool,
    /// The given command (`-genkeypair`, `-exportcert`, `pkcs12`, ...) exits 1.
    Fail(&'static str),
    /// The given command exits 0 without writing anything.
    SkipOutput(&'static str),
}

/// Parsed stand-in keystore.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeKeystore {
    pub alias: String,
    pub password: String,
    pub dname: String,
    pub key_id: u32,
    pub renewals: u32,
}

impl FakeKeystore {
    pub fn read(path: &Path) -> Option<Self> {
        let text = std::fs::read_to_string(path).ok()?;
        let mut lines = text.lines();
        if lines.next()? != MAGIC {
            return None;
        }
        Some(Self {
            alias: lines.next()?.to_string(),
            password: lines.next()?.to_string(),
            dname: lines.next()?.to_string(),
            key_id: lines.next()?.parse().ok()?,
            renewals: lines.next()?.parse().ok()?,
        })
    }

    pub fn write(&self, path: &Path) -> std::io::Result<()> {
        std::fs::write(
            path,
            format!(
                "{}\n{}\n{}\n{}\n{}\n{}\n",
                MAGIC, self.alias, self.password, self.dname, self.key_id, self.renewals
            ),
        )
    }

    fn pem(&self) -> String {
        format!(
            "-----BEGIN CERTIFICATE-----\nMOCK{:08}R{}\n-----END CERTIFICATE-----\n",
            self.key_id, self.renewals
        )
    }
}

pub struct MockRunner {
    behavior: MockBehavior,
    calls: Mutex<Vec<ToolInvocation>>,
    next_key: AtomicU32,
}

impl MockRunner {
    pub fn new() -> Self {
        Self::with(MockBehavior::Normal)
    }

    pub fn with(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            calls: Mutex::new(Vec::new()),
            next_key: AtomicU32::new(1),
        }
    }

    pub fn calls(&self) -> Vec<ToolInvocation> {
        self.calls.lock().unwrap().clone()
    }

    /// Commands (first argument) in call order.
    pub fn commands(&self) -> Vec<String> {
        self.calls()
            .iter()
            .map(|c| c.args.first().cloned().unwrap_or_default())
            .collect()
    }

    fn emulate(&self, inv: &ToolInvocation, command: &str) -> ToolOutput {
        let open = |path_flag: &str| -> Result<FakeKeystore, ToolOutput> {
            let path = inv.value_of(path_flag).unwrap_or_default();
            FakeKeystore::read(Path::new(path))
                .ok_or_else(|| failed("keytool error: java.io.IOException: Invalid keystore format"))
        };
        let authorize = |ks: &FakeKeystore| -> Result<(), ToolOutput> {
            if inv.value_of("-storepass") != Some(ks.password.as_str()) {
                return Err(failed("keytool error: java.io.IOException: keystore password was incorrect"));
            }
            if inv.value_of("-alias") != Some(ks.alias.as_str()) {
                return Err(failed("keytool error: java.lang.Exception: Alias does not exist"));
            }
            Ok(())
        };

        let result: Result<ToolOutput, ToolOutput> = (|| match command {
            "-genkeypair" => {
                let path = Path::new(inv.value_of("-keystore").unwrap_or_default());
                if path.exists() {
                    return Err(failed("keytool error: alias already exists"));
                }
                let ks = FakeKeystore {
                    alias: inv.value_of("-alias").unwrap_or_default().to_string(),
                    password: inv.value_of("-storepass").unwrap_or_default().to_string(),
                    dname: inv.value_of("-dname").unwrap_or_default().to_string(),
                    key_id: self.next_key.fetch_add(1, Ordering::SeqCst),
                    renewals: 0,
                };
                ks.write(path).map_err(|e| failed(&e.to_string()))?;
                Ok(ok(""))
            }
            "-selfcert" => {
                let mut ks = open("-keystore")?;
                authorize(&ks)?;
                ks.renewals += 1;
                ks.write(Path::new(inv.value_of("-keystore").unwrap_or_default()))
                    .map_err(|e| failed(&e.to_string()))?;
                Ok(ok(""))
            }
            "-list" => {
                let ks = open("-keystore")?;
                authorize(&ks)?;
                Ok(ok(&format!(
                    "Alias name: {}\nEntry type: PrivateKeyEntry\nOwner: {}\nIssuer: {}\n",
                    ks.alias, ks.dname, ks.dname
                )))
            }
            "-exportcert" => {
                let ks = open("-keystore")?;
                authorize(&ks)?;
                std::fs::write(inv.value_of("-file").unwrap_or_default(), ks.pem())
                    .map_err(|e| failed(&e.to_string()))?;
                Ok(ok(""))
            }
            "pkcs12" => {
                let ks = open("-in")?;
                if inv.value_of("-passin") != Some(format!("pass:{}", ks.password).as_str()) {
                    return Err(failed("Mac verify error: invalid password?"));
                }
                std::fs::write(inv.value_of("-out").unwrap_or_default(), ks.pem())
                    .map_err(|e| failed(&e.to_string()))?;
                Ok(ok(""))
            }
            other => Err(failed(&format!("unsupported mock command {}", other))),
        })();

        result.unwrap_or_else(|e| e)
    }
}

impl Default for MockRunner {
    fn default() -> Self {
        Self::new()
    }
}

fn ok(stdout: &str) -> ToolOutput {
    ToolOutput {
        code: Some(0),
        stdout: stdout.to_string(),
        stderr: String::new(),
    }
}

fn failed(stderr: &str) -> ToolOutput {
    ToolOutput {
        code: Some(1),
        stdout: String::new(),
        stderr: stderr.to_string(),
    }
}

impl ToolRunner for MockRunner {
    async fn run(&self, invocation: &ToolInvocation) -> Result<ToolOutput, ToolError> {
        self.calls.lock().unwrap().push(invocation.clone());
        let command = invocation.args.first().cloned().unwrap_or_default();

        match self.behavior {
            MockBehavior::MissingTool => return Err(ToolError::NotFound(invocation.program.clone())),
            MockBehavior::Fail(c) if c == command => return Ok(failed("mock failure")),
            MockBehavior::SkipOutput(c) if c == command => return Ok(ok("")),
            _ => {}
        }

        Ok(self.emulate(invocation, &command))
    }
}
