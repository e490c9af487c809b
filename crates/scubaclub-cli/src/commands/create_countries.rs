use clap::Parser;
use scubaclub_dal::{country::CountryRepository, language::LanguageRepository};
use scubaclub_types::{config::BackendConfig, language::LanguageCode};

use crate::commands::{open_database, Executor};

/// ISO3 code, English name, Dutch name
pub const COUNTRIES: [(&str, &str, &str); 10] = [
    ("NLD", "Netherlands", "Nederland"),
    ("BEL", "Belgium", "België"),
    ("DEU", "Germany", "Duitsland"),
    ("FRA", "France", "Frankrijk"),
    ("GBR", "United Kingdom", "Verenigd Koninkrijk"),
    ("USA", "United States", "Verenigde Staten"),
    ("CAN", "Canada", "Canada"),
    ("ESP", "Spain", "Spanje"),
    ("ITA", "Italy", "Italië"),
    ("AUS", "Australia", "Australië"),
];

#[derive(Parser, Debug)]
pub struct CreateCountriesCmd {
    #[command(flatten)]
    backend: BackendConfig,
}

impl Executor for CreateCountriesCmd {
    async fn run(self) -> anyhow::Result<()> {
        let pool = open_database(&self.backend).await?;
        // translations need both languages
        LanguageRepository::new(pool.clone()).ensure_all().await?;
        let repository = CountryRepository::new(pool);
        for (iso_code, en, nl) in COUNTRIES {
            let (_, created) = repository
                .ensure(iso_code, &[(LanguageCode::En, en), (LanguageCode::Nl, nl)])
                .await?;
            if created {
                println!("Created country \"{iso_code}\"");
            } else {
                println!("Country \"{iso_code}\" already exists");
            }
        }
        println!("Country creation and translations completed.");
        Ok(())
    }
}
