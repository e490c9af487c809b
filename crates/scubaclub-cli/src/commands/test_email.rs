use clap::Parser;
use scubaclub_app::mailer::{LogMailer, Mailer as _, Message};

use crate::commands::Executor;

#[derive(Parser, Debug)]
pub struct TestEmailCmd {
    #[arg(help = "Email address to send test email to")]
    email: String,
    #[arg(
        long,
        env = "SCUBACLUB_DEFAULT_FROM_EMAIL",
        default_value = "noreply@scubaclub.local",
        help = "Sender address"
    )]
    from: String,
}

impl Executor for TestEmailCmd {
    async fn run(self) -> anyhow::Result<()> {
        println!("DEFAULT_FROM_EMAIL: {}", self.from);
        let message = Message {
            from: self.from,
            to: self.email.clone(),
            subject: "Test Email from ScubaDuikers".to_string(),
            body: "This is a test email to verify email configuration.".to_string(),
        };
        match LogMailer.send(message).await {
            Ok(()) => println!("Successfully sent test email to {}", self.email),
            Err(e) => eprintln!("Failed to send email: {e}"),
        }
        Ok(())
    }
}
