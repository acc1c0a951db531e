use std::io::{self, BufRead, Write};

/// Asks a yes/no question and blocks until a line is answered.
/// Only `y` or `yes` in any case count as agreement, end of input
/// counts as a refusal
pub fn confirm(input: &mut dyn BufRead, output: &mut dyn Write, question: &str) -> io::Result<bool> {
    write!(output, "{question} (y/n)? ")?;
    output.flush()?;

    let mut answer = String::new();
    if input.read_line(&mut answer)? == 0 {
        writeln!(output)?;
        return Ok(false);
    }

    let answer = answer.trim().to_lowercase();
    Ok(answer == "y" || answer == "yes")
}

#[cfg(test)]
mod test {
    use crate::prompt::confirm;
    use std::io::Cursor;

    fn ask(answer: &str) -> (bool, String) {
        let mut input = Cursor::new(answer.as_bytes().to_vec());
        let mut output = Vec::new();
        let result = confirm(&mut input, &mut output, "Do you want to continue").unwrap();
        (result, String::from_utf8(output).unwrap())
    }

    #[test]
    fn accepts_y() {
        let (result, output) = ask("y\n");
        assert!(result);
        assert_eq!(output, "Do you want to continue (y/n)? ");
        assert!(ask("Y\n").0);
        assert!(ask("  yes \n").0);
    }

    #[test]
    fn rejects_everything_else() {
        assert!(!ask("n\n").0);
        assert!(!ask("\n").0);
        assert!(!ask("sure\n").0);
    }

    #[test]
    fn end_of_input_is_no() {
        let (result, output) = ask("");
        assert!(!result);
        assert!(output.ends_with('\n'));
    }
}
