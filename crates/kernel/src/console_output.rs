use hal_interface::TraceOutput;

/// Line terminator used on the trace console.
const K_NEWLINE: &str = "\r\n";

/// Console output formatting directives.
///
/// This enum describes how a given string should be emitted to the trace output, including
/// whether to surround it with newlines or to overwrite the current line.
pub enum ConsoleFormatting<'a> {
    /// No formatting is done.
    StrNoFormatting(&'a str),
    /// New line is added after write.
    StrNewLineAfter(&'a str),
    /// New line is added before write.
    StrNewLineBefore(&'a str),
    /// New lines are added before and after write.
    StrNewLineBoth(&'a str),
    /// Carriage return first, so the string replaces the current line.
    StrOverwrite(&'a str),
    /// Only adds a new line.
    Newline,
}

impl ConsoleFormatting<'_> {
    /// Emits the formatted string to `p_output`.
    pub fn write_to(&self, p_output: &mut dyn TraceOutput) {
        match self {
            ConsoleFormatting::StrNoFormatting(l_str) => p_output.write_str(l_str),
            ConsoleFormatting::StrNewLineAfter(l_str) => {
                p_output.write_str(l_str);
                p_output.write_str(K_NEWLINE);
            }
            ConsoleFormatting::StrNewLineBefore(l_str) => {
                p_output.write_str(K_NEWLINE);
                p_output.write_str(l_str);
            }
            ConsoleFormatting::StrNewLineBoth(l_str) => {
                p_output.write_str(K_NEWLINE);
                p_output.write_str(l_str);
                p_output.write_str(K_NEWLINE);
            }
            ConsoleFormatting::StrOverwrite(l_str) => {
                p_output.write_str("\r");
                p_output.write_str(l_str);
            }
            ConsoleFormatting::Newline => p_output.write_str(K_NEWLINE),
        }
    }
}

/// Writes `p_fmt` to `p_output`.
pub fn console_write(p_output: &mut dyn TraceOutput, p_fmt: &ConsoleFormatting) {
    p_fmt.write_to(p_output);
}
