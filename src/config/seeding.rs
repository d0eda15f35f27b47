use anyhow::Result;
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::UserRole;
use crate::models::CreateUser;
use crate::services::UserService;

/// The 47 counties, keyed by official county code.
const KENYA_COUNTIES: [(i32, &str); 47] = [
    (1, "Mombasa"),
    (2, "Kwale"),
    (3, "Kilifi"),
    (4, "Tana River"),
    (5, "Lamu"),
    (6, "Taita Taveta"),
    (7, "Garissa"),
    (8, "Wajir"),
    (9, "Mandera"),
    (10, "Marsabit"),
    (11, "Isiolo"),
    (12, "Meru"),
    (13, "Tharaka Nithi"),
    (14, "Embu"),
    (15, "Kitui"),
    (16, "Machakos"),
    (17, "Makueni"),
    (18, "Nyandarua"),
    (19, "Nyeri"),
    (20, "Kirinyaga"),
    (21, "Murang'a"),
    (22, "Kiambu"),
    (23, "Turkana"),
    (24, "West Pokot"),
    (25, "Samburu"),
    (26, "Trans Nzoia"),
    (27, "Uasin Gishu"),
    (28, "Elgeyo Marakwet"),
    (29, "Nandi"),
    (30, "Baringo"),
    (31, "Laikipia"),
    (32, "Nakuru"),
    (33, "Narok"),
    (34, "Kajiado"),
    (35, "Kericho"),
    (36, "Bomet"),
    (37, "Kakamega"),
    (38, "Vihiga"),
    (39, "Bungoma"),
    (40, "Busia"),
    (41, "Siaya"),
    (42, "Kisumu"),
    (43, "Homa Bay"),
    (44, "Migori"),
    (45, "Kisii"),
    (46, "Nyamira"),
    (47, "Nairobi"),
];

const CADRES: [&str; 7] = [
    "Nurse",
    "Clinical Officer",
    "Medical Officer",
    "Laboratory Technologist",
    "Pharmacist",
    "Community Health Assistant",
    "Nutritionist",
];

const DEPARTMENTS: [&str; 6] = [
    "HIV Testing Services",
    "Maternal and Child Health",
    "Pharmacy",
    "Laboratory",
    "Community Health",
    "Nutrition",
];

pub struct DatabaseSeeder {
    pool: PgPool,
}

impl DatabaseSeeder {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn seed_all(&self) -> Result<()> {
        tracing::info!("Starting database seeding...");

        self.seed_counties().await?;
        self.seed_cadres().await?;
        self.seed_departments().await?;
        self.seed_admin_user().await?;

        tracing::info!("Database seeding completed!");
        Ok(())
    }

    async fn seed_counties(&self) -> Result<()> {
        for (code, name) in KENYA_COUNTIES {
            sqlx::query(
                "INSERT INTO counties (id, code, name) VALUES ($1, $2, $3)
                 ON CONFLICT (code) DO NOTHING",
            )
            .bind(Uuid::new_v4())
            .bind(code)
            .bind(name)
            .execute(&self.pool)
            .await?;
        }

        Ok(())
    }

    async fn seed_cadres(&self) -> Result<()> {
        for name in CADRES {
            sqlx::query(
                "INSERT INTO cadres (id, name) VALUES ($1, $2) ON CONFLICT (name) DO NOTHING",
            )
            .bind(Uuid::new_v4())
            .bind(name)
            .execute(&self.pool)
            .await?;
        }

        Ok(())
    }

    async fn seed_departments(&self) -> Result<()> {
        for name in DEPARTMENTS {
            sqlx::query(
                "INSERT INTO departments (id, name) VALUES ($1, $2) ON CONFLICT (name) DO NOTHING",
            )
            .bind(Uuid::new_v4())
            .bind(name)
            .execute(&self.pool)
            .await?;
        }

        Ok(())
    }

    async fn seed_admin_user(&self) -> Result<()> {
        let user_service = UserService::new(self.pool.clone());

        let email =
            std::env::var("ADMIN_EMAIL").unwrap_or_else(|_| "admin@mentortrack.health".to_string());
        let password = std::env::var("ADMIN_PASSWORD").unwrap_or_else(|_| "ChangeMe2025".to_string());

        if user_service.get_user_by_email(&email).await?.is_none() {
            user_service
                .create_user(CreateUser {
                    email: email.clone(),
                    password,
                    full_name: "Platform Administrator".to_string(),
                    role: Some(UserRole::Admin),
                })
                .await?;
            tracing::info!("Created default admin user {}", email);
        }

        Ok(())
    }
}
