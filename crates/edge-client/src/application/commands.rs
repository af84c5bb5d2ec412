//! Console command parsing and local validation.
//!
//! Every line the user types goes through [`parse_command`] before anything
//! touches the network.  A line that names an unknown verb, has the wrong
//! number of arguments, or carries a malformed fileID, amount, or compute
//! operation is rejected here with a [`UsageError`] whose `Display` text is
//! exactly what the console prints.

use std::fmt;

use edge_core::{ComputeOperation, FileId};
use thiserror::Error;

/// The prompt printed before each command line.
pub const COMMAND_PROMPT: &str =
    "Enter one of the following commands (EDG, UED, SCS, DTE, AED, UVF, OUT): ";

/// The seven console verbs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Edg,
    Ued,
    Scs,
    Dte,
    Aed,
    Uvf,
    Out,
}

impl Verb {
    fn parse(token: &str) -> Option<Self> {
        Some(match token {
            "EDG" => Verb::Edg,
            "UED" => Verb::Ued,
            "SCS" => Verb::Scs,
            "DTE" => Verb::Dte,
            "AED" => Verb::Aed,
            "UVF" => Verb::Uvf,
            "OUT" => Verb::Out,
            _ => return None,
        })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Verb::Edg => "EDG",
            Verb::Ued => "UED",
            Verb::Scs => "SCS",
            Verb::Dte => "DTE",
            Verb::Aed => "AED",
            Verb::Uvf => "UVF",
            Verb::Out => "OUT",
        }
    }

    /// Number of arguments after the verb.
    fn arity(self) -> usize {
        match self {
            Verb::Edg | Verb::Scs | Verb::Uvf => 2,
            Verb::Ued | Verb::Dte => 1,
            Verb::Aed | Verb::Out => 0,
        }
    }

    fn arguments(self) -> &'static str {
        match self {
            Verb::Edg => "TWO arguments fileID and dataAmount",
            Verb::Ued | Verb::Dte => "ONE argument fileID",
            Verb::Scs => "TWO arguments fileID and computationOperation",
            Verb::Uvf => "TWO arguments deviceName and filename",
            Verb::Aed | Verb::Out => "no arguments",
        }
    }

    fn example(self) -> &'static str {
        match self {
            Verb::Edg => "EDG 1 10",
            Verb::Ued => "UED 1",
            Verb::Scs => "SCS 1 SUM",
            Verb::Dte => "DTE 1",
            Verb::Aed => "AED",
            Verb::Uvf => "UVF Supersmartwatch Yoda-1.txt",
            Verb::Out => "OUT",
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated console command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserCommand {
    /// `EDG fileID dataAmount`
    Generate { file_id: FileId, amount: u32 },
    /// `UED fileID`
    Upload { file_id: FileId },
    /// `SCS fileID operation`
    Compute {
        file_id: FileId,
        operation: ComputeOperation,
    },
    /// `DTE fileID`
    Delete { file_id: FileId },
    /// `AED`
    ActiveDevices,
    /// `UVF deviceName filename`
    Transfer { device: String, filename: String },
    /// `OUT`
    Logout,
}

/// Why a console line was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UsageError {
    #[error("Error - \"{0}\" is an invalid Command.")]
    InvalidCommand(String),

    #[error("{verb}: ERROR - {verb} command requires {}. Commands are like \"{}\"", .verb.arguments(), .verb.example())]
    ArgumentCount { verb: Verb },

    #[error("EDG: ERROR - The fileID or dataAmount are not integers, you need to specify the parameter as integers. Commands are like \"EDG 1 10\"")]
    GenerateNotInteger,

    #[error("EDG: ERROR - The fileID and dataAmount should be positive integers. Commands are like \"EDG 1 10\"")]
    GenerateNotPositive,

    #[error("{verb}: ERROR - The fileID is not integer, you need to specify the parameter as integers. Commands are like \"{}\"", .verb.example())]
    FileIdNotInteger { verb: Verb },

    #[error("{verb}: ERROR - The fileID should be positive integer. Commands are like \"{}\"", .verb.example())]
    FileIdNotPositive { verb: Verb },

    #[error("SCS: ERROR - The computationOperation should be one of the following [\"AVERAGE\", \"MIN\", \"MAX\", \"SUM\"]. Commands are like \"SCS 1 SUM\"")]
    UnknownOperation,
}

/// Parses one console line.
///
/// # Errors
///
/// Returns the [`UsageError`] to print when the line is not a valid command.
pub fn parse_command(line: &str) -> Result<UserCommand, UsageError> {
    let invalid = || UsageError::InvalidCommand(line.to_string());

    if line.chars().count() < 3 {
        return Err(invalid());
    }

    let mut tokens = line.split_whitespace();
    let verb = tokens.next().and_then(Verb::parse).ok_or_else(invalid)?;
    let args: Vec<&str> = tokens.collect();
    if args.len() != verb.arity() {
        return Err(UsageError::ArgumentCount { verb });
    }

    match verb {
        Verb::Edg => parse_generate(args[0], args[1]),
        Verb::Ued => Ok(UserCommand::Upload {
            file_id: parse_file_id(verb, args[0])?,
        }),
        Verb::Scs => {
            let file_id = parse_file_id(verb, args[0])?;
            let operation = args[1]
                .parse()
                .map_err(|()| UsageError::UnknownOperation)?;
            Ok(UserCommand::Compute { file_id, operation })
        }
        Verb::Dte => Ok(UserCommand::Delete {
            file_id: parse_file_id(verb, args[0])?,
        }),
        Verb::Aed => Ok(UserCommand::ActiveDevices),
        Verb::Uvf => Ok(UserCommand::Transfer {
            device: args[0].to_string(),
            filename: args[1].to_string(),
        }),
        Verb::Out => Ok(UserCommand::Logout),
    }
}

fn parse_file_id(verb: Verb, raw: &str) -> Result<FileId, UsageError> {
    let n: i64 = raw
        .parse()
        .map_err(|_| UsageError::FileIdNotInteger { verb })?;
    if n < 1 {
        return Err(UsageError::FileIdNotPositive { verb });
    }
    u32::try_from(n)
        .ok()
        .and_then(FileId::new)
        .ok_or(UsageError::FileIdNotInteger { verb })
}

fn parse_generate(raw_id: &str, raw_amount: &str) -> Result<UserCommand, UsageError> {
    let (Ok(id), Ok(amount)) = (raw_id.parse::<i64>(), raw_amount.parse::<i64>()) else {
        return Err(UsageError::GenerateNotInteger);
    };
    if id < 1 || amount < 1 {
        return Err(UsageError::GenerateNotPositive);
    }
    let file_id = u32::try_from(id)
        .ok()
        .and_then(FileId::new)
        .ok_or(UsageError::GenerateNotInteger)?;
    let amount = u32::try_from(amount).map_err(|_| UsageError::GenerateNotInteger)?;
    Ok(UserCommand::Generate { file_id, amount })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
