//! Text protocol for input events sent back to the source application.
//!
//! Every command is a single text message `Name` or `Name=arg,arg,...`.
//! Booleans travel as `0`/`1`.
//!
//! ```rust
//! use remote_imgui::InputCommand;
//!
//! let command = InputCommand::MouseMove { x: 120, y: 48, left: true, right: false };
//! assert_eq!(command.to_string(), "ImMouseMove=120,48,1,0");
//! assert_eq!("ImKeyUp=37".parse::<InputCommand>().unwrap(), InputCommand::KeyUp { code: 37 });
//! ```

use std::fmt;
use std::str::FromStr;

use crate::{RemoteError, Result};

/// Key code the source application maps to `V`, used to trigger paste.
const KEY_V: u32 = 86;

/// One input event in the text protocol.
#[derive(Debug, Clone, PartialEq)]
pub enum InputCommand {
    /// Session handshake; the server echoes it back once ready
    Init,
    /// Pointer position in source canvas pixels with button state
    MouseMove { x: i32, y: i32, left: bool, right: bool },
    MousePress { left: bool, right: bool },
    MouseWheelDelta { delta: f32 },
    KeyDown { code: u32, shift: bool, ctrl: bool },
    KeyUp { code: u32 },
    /// Character input as a character code
    KeyPress { char_code: u32 },
    Clipboard { text: String },
}

impl InputCommand {
    /// The two commands a paste produces: clipboard contents, then ctrl+V.
    pub fn paste(text: impl Into<String>) -> [InputCommand; 2] {
        [
            InputCommand::Clipboard { text: text.into() },
            InputCommand::KeyDown { code: KEY_V, shift: false, ctrl: true },
        ]
    }

    /// Protocol name of the command.
    pub fn name(&self) -> &'static str {
        match self {
            InputCommand::Init => "ImInit",
            InputCommand::MouseMove { .. } => "ImMouseMove",
            InputCommand::MousePress { .. } => "ImMousePress",
            InputCommand::MouseWheelDelta { .. } => "ImMouseWheelDelta",
            InputCommand::KeyDown { .. } => "ImKeyDown",
            InputCommand::KeyUp { .. } => "ImKeyUp",
            InputCommand::KeyPress { .. } => "ImKeyPress",
            InputCommand::Clipboard { .. } => "ImClipboard",
        }
    }
}

fn flag(value: bool) -> u8 {
    u8::from(value)
}

impl fmt::Display for InputCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.name();
        match self {
            InputCommand::Init => f.write_str(name),
            InputCommand::MouseMove { x, y, left, right } => {
                write!(f, "{name}={x},{y},{},{}", flag(*left), flag(*right))
            }
            InputCommand::MousePress { left, right } => {
                write!(f, "{name}={},{}", flag(*left), flag(*right))
            }
            InputCommand::MouseWheelDelta { delta } => write!(f, "{name}={delta}"),
            InputCommand::KeyDown { code, shift, ctrl } => {
                write!(f, "{name}={code},{},{}", flag(*shift), flag(*ctrl))
            }
            InputCommand::KeyUp { code } => write!(f, "{name}={code}"),
            InputCommand::KeyPress { char_code } => write!(f, "{name}={char_code}"),
            InputCommand::Clipboard { text } => write!(f, "{name}={text}"),
        }
    }
}

impl FromStr for InputCommand {
    type Err = RemoteError;

    fn from_str(input: &str) -> Result<Self> {
        let invalid = || RemoteError::InvalidCommand { input: input.to_string() };

        let (name, args) = match input.split_once('=') {
            Some((name, args)) => (name, Some(args)),
            None => (input, None),
        };

        // Clipboard text may itself contain commas.
        if name == "ImClipboard" {
            return Ok(InputCommand::Clipboard { text: args.ok_or_else(invalid)?.to_string() });
        }

        let fields: Vec<&str> = args.map(|a| a.split(',').collect()).unwrap_or_default();
        let number = |i: usize| -> Result<i64> {
            fields.get(i).and_then(|f| f.trim().parse::<i64>().ok()).ok_or_else(invalid)
        };
        let unsigned = |i: usize| -> Result<u32> {
            number(i).and_then(|n| u32::try_from(n).map_err(|_| invalid()))
        };
        let signed = |i: usize| -> Result<i32> {
            number(i).and_then(|n| i32::try_from(n).map_err(|_| invalid()))
        };
        let boolean = |i: usize| -> Result<bool> {
            match fields.get(i).map(|f| f.trim()) {
                Some("0") => Ok(false),
                Some("1") => Ok(true),
                _ => Err(invalid()),
            }
        };
        let arity = |expected: usize| -> Result<()> {
            if fields.len() == expected { Ok(()) } else { Err(invalid()) }
        };

        match name {
            "ImInit" if args.is_none() => Ok(InputCommand::Init),
            "ImMouseMove" => {
                arity(4)?;
                Ok(InputCommand::MouseMove {
                    x: signed(0)?,
                    y: signed(1)?,
                    left: boolean(2)?,
                    right: boolean(3)?,
                })
            }
            "ImMousePress" => {
                arity(2)?;
                Ok(InputCommand::MousePress { left: boolean(0)?, right: boolean(1)? })
            }
            "ImMouseWheelDelta" => {
                arity(1)?;
                let delta = fields[0].trim().parse::<f32>().map_err(|_| invalid())?;
                if !delta.is_finite() {
                    return Err(invalid());
                }
                Ok(InputCommand::MouseWheelDelta { delta })
            }
            "ImKeyDown" => {
                arity(3)?;
                Ok(InputCommand::KeyDown {
                    code: unsigned(0)?,
                    shift: boolean(1)?,
                    ctrl: boolean(2)?,
                })
            }
            "ImKeyUp" => {
                arity(1)?;
                Ok(InputCommand::KeyUp { code: unsigned(0)? })
            }
            "ImKeyPress" => {
                arity(1)?;
                Ok(InputCommand::KeyPress { char_code: unsigned(0)? })
            }
            _ => Err(invalid()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn commands_render_exact_protocol_text() {
        let cases = [
            (InputCommand::Init, "ImInit"),
            (
                InputCommand::MouseMove { x: -3, y: 700, left: false, right: true },
                "ImMouseMove=-3,700,0,1",
            ),
            (InputCommand::MousePress { left: true, right: false }, "ImMousePress=1,0"),
            (InputCommand::MouseWheelDelta { delta: -1.0 }, "ImMouseWheelDelta=-1"),
            (InputCommand::MouseWheelDelta { delta: 0.25 }, "ImMouseWheelDelta=0.25"),
            (InputCommand::KeyDown { code: 9, shift: true, ctrl: false }, "ImKeyDown=9,1,0"),
            (InputCommand::KeyUp { code: 13 }, "ImKeyUp=13"),
            (InputCommand::KeyPress { char_code: 97 }, "ImKeyPress=97"),
            (InputCommand::Clipboard { text: "a,b=c".to_string() }, "ImClipboard=a,b=c"),
        ];

        for (command, text) in cases {
            assert_eq!(command.to_string(), text);
            assert_eq!(text.parse::<InputCommand>().unwrap(), command);
        }
    }

    #[test]
    fn paste_sends_clipboard_then_ctrl_v() {
        let [clipboard, key] = InputCommand::paste("hello");
        assert_eq!(clipboard.to_string(), "ImClipboard=hello");
        assert_eq!(key.to_string(), "ImKeyDown=86,0,1");
    }

    #[test]
    fn malformed_commands_are_rejected() {
        for text in [
            "",
            "ImInit=1",
            "ImMouseMove=1,2,3",
            "ImMousePress=2,0",
            "ImKeyUp=-1",
            "ImKeyDown=1,0",
            "ImMouseWheelDelta=NaN",
            "ImClipboard",
            "ImUnknown=1",
        ] {
            assert!(
                matches!(text.parse::<InputCommand>(), Err(RemoteError::InvalidCommand { .. })),
                "{text:?} should be rejected"
            );
        }
    }

    proptest! {
        #[test]
        fn mouse_moves_round_trip(
            x in any::<i32>(),
            y in any::<i32>(),
            left in any::<bool>(),
            right in any::<bool>(),
        ) {
            let command = InputCommand::MouseMove { x, y, left, right };
            prop_assert_eq!(command.to_string().parse::<InputCommand>().unwrap(), command);
        }

        #[test]
        fn wheel_deltas_round_trip(delta in -1.0e6f32..1.0e6) {
            let command = InputCommand::MouseWheelDelta { delta };
            prop_assert_eq!(command.to_string().parse::<InputCommand>().unwrap(), command);
        }

        #[test]
        fn clipboard_text_round_trips(text in "[a-zA-Z0-9 ,=.:/_-]*") {
            let command = InputCommand::Clipboard { text };
            prop_assert_eq!(command.to_string().parse::<InputCommand>().unwrap(), command);
        }
    }
}
