//! Pattern stage: deterministic risk rules over normalized text
//!
//! Rules live in a versioned [`RuleTable`] (built in, or loaded from YAML at
//! startup). Evaluation follows declaration order and the first matching rule
//! wins; there is no attempt to find the "best" match. Matching never calls
//! out of process, so a [`PatternMatcher`] can be shared freely across
//! threads.

use agentguard_core::{normalize, Error, Result};
use regex::{RegexSet, RegexSetBuilder};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Version of the built-in rule table
pub const BUILTIN_RULES_VERSION: &str = "2026.1";

/// Risk categories covered by the rule table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskCategory {
    /// Deleting, wiping or formatting files and disks
    DestructiveFilesystem,
    /// Asking for passwords, keys or other secrets
    CredentialSolicitation,
    /// Asking for card, bank or identity numbers
    FinancialData,
    /// Disabling protections or escalating privileges
    SecurityBypass,
    /// Installing or writing malicious software
    Malware,
    /// Moving private data out of the system
    DataExfiltration,
}

impl RiskCategory {
    /// Get the snake_case label
    pub fn label(&self) -> &'static str {
        match self {
            Self::DestructiveFilesystem => "destructive_filesystem",
            Self::CredentialSolicitation => "credential_solicitation",
            Self::FinancialData => "financial_data",
            Self::SecurityBypass => "security_bypass",
            Self::Malware => "malware",
            Self::DataExfiltration => "data_exfiltration",
        }
    }
}

impl fmt::Display for RiskCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single risk rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternRule {
    /// Stable rule identifier
    pub id: String,

    /// Regex over lowercase text
    pub pattern: String,

    /// Reason reported when this rule matches
    pub description: String,

    /// Risk category
    pub category: RiskCategory,
}

/// Ordered, versioned list of rules
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleTable {
    /// Table version, reported in logs
    pub version: String,

    /// Rules in evaluation order
    pub rules: Vec<PatternRule>,
}

impl RuleTable {
    /// The built-in rule table
    pub fn builtin() -> Self {
        let rules = BUILTIN_RULES
            .iter()
            .map(|(id, category, description, pattern)| PatternRule {
                id: id.to_string(),
                pattern: pattern.to_string(),
                description: description.to_string(),
                category: *category,
            })
            .collect();

        Self {
            version: BUILTIN_RULES_VERSION.to_string(),
            rules,
        }
    }

    /// Load a rule table from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml)
            .map_err(|e| Error::config(format!("invalid rule table: {}", e)))
    }

    /// Load a rule table from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }
}

/// The rule that fired for a piece of text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternMatch {
    /// Rule identifier
    pub rule_id: String,

    /// Rule description, used as the block reason
    pub description: String,

    /// Rule category
    pub category: RiskCategory,
}

/// Compiled rule table
#[derive(Debug, Clone)]
pub struct PatternMatcher {
    version: String,
    rules: Vec<PatternRule>,
    set: RegexSet,
}

impl PatternMatcher {
    /// Compile a rule table.
    ///
    /// Fails on an empty table, duplicate rule ids, or an invalid regex.
    pub fn new(table: RuleTable) -> Result<Self> {
        if table.rules.is_empty() {
            return Err(Error::policy("rule table has no rules"));
        }

        for (i, rule) in table.rules.iter().enumerate() {
            if table.rules[..i].iter().any(|r| r.id == rule.id) {
                return Err(Error::policy(format!("duplicate rule id '{}'", rule.id)));
            }
        }

        let set = RegexSetBuilder::new(table.rules.iter().map(|r| r.pattern.as_str()))
            .case_insensitive(true)
            .dot_matches_new_line(true)
            .build()
            .map_err(|e| Error::policy(format!("failed to compile rule table: {}", e)))?;

        tracing::debug!(
            version = %table.version,
            rules = table.rules.len(),
            "Compiled pattern rule table"
        );

        Ok(Self {
            version: table.version,
            rules: table.rules,
            set,
        })
    }

    /// Compile the built-in rule table
    pub fn builtin() -> Result<Self> {
        Self::new(RuleTable::builtin())
    }

    /// Return the first rule, in declaration order, that matches `text`
    pub fn matches(&self, text: &str) -> Option<PatternMatch> {
        let normalized = normalize(text);
        let index = self.set.matches(&normalized).into_iter().next()?;
        let rule = &self.rules[index];

        Some(PatternMatch {
            rule_id: rule.id.clone(),
            description: rule.description.clone(),
            category: rule.category,
        })
    }

    /// Whether any rule matches `text`
    pub fn is_match(&self, text: &str) -> bool {
        self.set.is_match(&normalize(text))
    }

    /// Rule table version
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Rules in evaluation order
    pub fn rules(&self) -> &[PatternRule] {
        &self.rules
    }
}

use RiskCategory::*;

/// (id, category, description, pattern)
const BUILTIN_RULES: &[(&str, RiskCategory, &str, &str)] = &[
    (
        "fs.system-files",
        DestructiveFilesystem,
        "destructive operation on system files",
        r"\b(delete|remove|erase|wipe|destroy|corrupt|overwrite)\b.*\b(system|system32|boot|windows|kernel|os)\b.*\bfiles?\b",
    ),
    (
        "fs.recursive-remove",
        DestructiveFilesystem,
        "recursive forced file removal command",
        r"\brm\s+(-rf|-fr|-r|--recursive|--no-preserve-root)\b",
    ),
    (
        "fs.format-drive",
        DestructiveFilesystem,
        "drive format command",
        r"\bformat\s+[a-z]:",
    ),
    (
        "fs.wipe-disk",
        DestructiveFilesystem,
        "request to wipe a disk or partition",
        r"\b(wipe|erase|shred|zero out)\b.*\b(hard\s*drive|hard\s*disk|disk|drive|partition|ssd)s?\b",
    ),
    (
        "fs.low-level-destroy",
        DestructiveFilesystem,
        "low-level disk destruction command",
        r"\b(mkfs|diskpart)\b|\bdd\s+if=|\bdel\s+/[sfq]\b",
    ),
    (
        "cred.secret-request",
        CredentialSolicitation,
        "solicitation of passwords or secret credentials",
        r"\b(tell|give|send|share|reveal|provide|show|what\s+is|what'?s)\b.*\b(your|his|her|their|someone'?s|somebody'?s|the\s+(admin|administrator|user|owner)'?s?)\s+(\w+\s+)?(password|passcode|passphrase|login\s+credentials|credentials|api\s+key|secret\s+key|private\s+key|2fa\s+code|otp|pin)s?\b",
    ),
    (
        "cred.theft",
        CredentialSolicitation,
        "credential theft attempt",
        r"\b(steal|harvest|phish|crack|brute[\s-]?force)\b.*\b(passwords?|credentials|accounts?|logins?)\b",
    ),
    (
        "fin.credit-card",
        FinancialData,
        "credit card data solicitation",
        r"\bcredit\s*card\s*(numbers?|details?|info(rmation)?|data|cvv|cvc|pin)\b",
    ),
    (
        "fin.bank-account",
        FinancialData,
        "bank account data solicitation",
        r"\b(bank|checking|savings|routing)\s+(account\s+)?(numbers?|details|info(rmation)?|credentials|login)\b",
    ),
    (
        "fin.identity-number",
        FinancialData,
        "social security number solicitation",
        r"\bsocial\s+security\s+numbers?\b|\bssn\b",
    ),
    (
        "sec.bypass",
        SecurityBypass,
        "attempt to bypass or disable security controls",
        r"\b(bypass|disable|circumvent|turn\s+off|get\s+around)\b.*\b(security|authentication|firewall|antivirus|anti-virus|defender|uac|2fa|mfa|password\s+protection)\b",
    ),
    (
        "sec.privilege-escalation",
        SecurityBypass,
        "privilege escalation attempt",
        r"\b(escalate|elevate|gain|obtain|get)\b.*\b(root|admin|administrator|superuser)\s+(access|privileges?|rights|permissions)\b",
    ),
    (
        "sec.world-writable",
        SecurityBypass,
        "making system paths world-writable",
        r"\bchmod\s+(-r\s+)?777\s+/",
    ),
    (
        "mal.deploy",
        Malware,
        "malware deployment or authoring",
        r"\b(install|deploy|write|create|run|inject|spread|build)\b.*\b(malware|ransomware|keylogger|rootkit|trojan|spyware|backdoor|botnet|computer\s+virus)\b",
    ),
    (
        "exfil.private-data",
        DataExfiltration,
        "access to private data",
        r"\b(access|read|steal|dump|leak|exfiltrate|copy|download)\b.*\b(private|confidential|sensitive|someone\s+else'?s|other\s+users'?)\s+(files?|data|documents?|records|emails?)\b",
    ),
    (
        "exfil.external-upload",
        DataExfiltration,
        "transfer of data to an external destination",
        r"\b(upload|send|transfer|exfiltrate|forward)\b.*\b(to|onto)\s+(an?\s+)?(external|remote|attacker'?s?|personal)\s+(server|host|machine|email|address|bucket)\b",
    ),
    (
        "exfil.dump-secrets",
        DataExfiltration,
        "dumping credential stores",
        r"\b(dump|steal|leak)\b.*\b(password\s+(hashes|database|file)|credentials|credential\s+store|user\s+table|(user|customer|account)s?'?\s+passwords)\b|/etc/(shadow|passwd)\b",
    ),
];
