// ============================================================================
// MODELS - MODULE PRINCIPAL
// ============================================================================
//
// Description:
//   Point d'entrée pour tous les modèles de données.
//   Chaque entité correspond à une table (PostgreSQL en prod, SQLite en test).
//
// Liste des modules:
//   - health : Health check API
//   - users : Utilisateurs (identité, vérification, reset password, profil)
//   - drafts : Brouillons d'onboarding, un par (user_id, role)
//   - vendor_applications : Candidatures vendeur (parcours simple)
//   - onboarding : Schémas typés des étapes par rôle
//   - dto : Requêtes / réponses de l'API
//
// Points d'attention:
//   - Les relations entre tables sont définies dans chaque modèle
//   - Les tables sont créées au démarrage (db::ensure_schema)
//
// ============================================================================

pub mod dto;
pub mod drafts;
pub mod health;
pub mod onboarding;
pub mod users;
pub mod vendor_applications;
