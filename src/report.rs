/*!
Custom Snafu error printer for the command-line front end
*/

use std::error::Error as StdError;

/// Prints an error followed by its numbered chain of causes when returned
/// from `main`.
pub struct Report(Box<dyn StdError>);

impl Report {
    /// Iterates over the causes of the wrapped error, outermost first.
    pub fn causes(&self) -> impl Iterator<Item = &(dyn StdError + 'static)> {
        std::iter::successors(self.0.source(), |&e| e.source())
    }
}

impl std::fmt::Debug for Report {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{}", self.0)?;

        let mut causes = self.causes().enumerate().peekable();
        if causes.peek().is_some() {
            writeln!(f, "\nCaused by:")?;
            for (i, e) in causes {
                writeln!(f, "  {}: {}", i, e)?;
            }
        }

        Ok(())
    }
}

impl<E: Into<Box<dyn StdError>>> From<E> for Report {
    fn from(e: E) -> Self {
        Report(e.into())
    }
}

#[cfg(test)]
mod tests {
    use crate::prelude::*;

    use super::Report;

    #[derive(Debug, Snafu)]
    enum Inner {
        #[snafu(display("disk on fire"))]
        Disk { source: std::io::Error },
    }

    #[derive(Debug, Snafu)]
    enum Outer {
        #[snafu(display("failed to load"))]
        Load { source: Inner },
    }

    fn failing_load() -> Result<(), Outer> {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "no space left");
        Err(io).context(Disk).context(Load)
    }

    #[test]
    fn causes_are_listed_outermost_first() {
        let report = Report::from(failing_load().unwrap_err());

        let causes = report.causes().map(|e| e.to_string()).collect::<Vec<_>>();
        assert_eq!(causes, vec!["disk on fire", "no space left"]);
        assert_eq!(
            format!("{:?}", report),
            "failed to load\n\nCaused by:\n  0: disk on fire\n  1: no space left\n"
        );
    }

    #[test]
    fn sourceless_errors_print_alone() {
        let report = Report::from("plain message");
        assert_eq!(report.causes().count(), 0);
        assert_eq!(format!("{:?}", report), "plain message\n");
    }
}
