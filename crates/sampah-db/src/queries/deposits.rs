use anyhow::Result;
use rusqlite::Row;

use sampah_types::models::DepositStatus;
use sampah_types::time::now_timestamp;

use super::{OptionalExt, parse_col};
use crate::Database;
use crate::models::{DepositChange, DepositRow, NewDeposit, OwnerRow};

const DEPOSIT_COLUMNS: &str = "d.id, d.user_id, d.school_name, d.contact_name, d.contact_phone, \
     d.address, d.pickup_date, d.bin_count, d.waste_type, d.photo_proof, d.weight, d.status, \
     d.picker_id, d.picker_name, d.created_at, d.updated_at";

const DEPOSIT_COLUMN_COUNT: usize = 16;

impl Database {
    // -- Deposits --

    /// New deposits always start `pending` with no weight.
    pub fn insert_deposit(&self, deposit: &NewDeposit<'_>) -> Result<()> {
        let now = now_timestamp();
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO waste_deposits (id, user_id, school_name, contact_name, contact_phone,
                     address, pickup_date, bin_count, waste_type, photo_proof, status,
                     created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?12)",
                rusqlite::params![
                    deposit.id,
                    deposit.user_id,
                    deposit.school_name,
                    deposit.contact_name,
                    deposit.contact_phone,
                    deposit.address,
                    deposit.pickup_date,
                    deposit.bin_count,
                    deposit.waste_type,
                    deposit.photo_proof,
                    DepositStatus::Pending.as_str(),
                    now,
                ],
            )?;
            Ok(())
        })
    }

    pub fn get_deposit(&self, id: &str) -> Result<Option<DepositRow>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {DEPOSIT_COLUMNS} FROM waste_deposits d WHERE d.id = ?1");
            let mut stmt = conn.prepare(&sql)?;
            let row = stmt.query_row([id], map_deposit).optional()?;
            Ok(row)
        })
    }

    /// Owner-scoped lookup; another user's deposit is reported as absent.
    pub fn get_owned_deposit(&self, id: &str, user_id: &str) -> Result<Option<DepositRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {DEPOSIT_COLUMNS} FROM waste_deposits d WHERE d.id = ?1 AND d.user_id = ?2"
            );
            let mut stmt = conn.prepare(&sql)?;
            let row = stmt.query_row([id, user_id], map_deposit).optional()?;
            Ok(row)
        })
    }

    pub fn list_deposits_for_user(&self, user_id: &str) -> Result<Vec<DepositRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {DEPOSIT_COLUMNS} FROM waste_deposits d
                 WHERE d.user_id = ?1
                 ORDER BY d.created_at DESC, d.rowid DESC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([user_id], map_deposit)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Every deposit, newest first, with its owner joined in (single query).
    pub fn list_all_deposits(&self) -> Result<Vec<(DepositRow, Option<OwnerRow>)>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {DEPOSIT_COLUMNS}, u.id, u.name, u.email, u.school_name
                 FROM waste_deposits d
                 LEFT JOIN users u ON u.id = d.user_id
                 ORDER BY d.created_at DESC, d.rowid DESC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([], |row| {
                    let deposit = map_deposit(row)?;
                    let base = DEPOSIT_COLUMN_COUNT;
                    let owner = match row.get::<_, Option<String>>(base)? {
                        Some(id) => Some(OwnerRow {
                            id,
                            name: row.get(base + 1)?,
                            email: row.get(base + 2)?,
                            school_name: row.get(base + 3)?,
                        }),
                        None => None,
                    };
                    Ok((deposit, owner))
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Write status, weight and picker in one statement. Returns false when
    /// the deposit does not exist.
    pub fn apply_deposit_change(&self, id: &str, change: &DepositChange<'_>) -> Result<bool> {
        let now = now_timestamp();
        self.with_conn(|conn| {
            let n = conn.execute(
                "UPDATE waste_deposits
                 SET status = ?2, weight = ?3, picker_id = ?4, picker_name = ?5, updated_at = ?6
                 WHERE id = ?1",
                rusqlite::params![
                    id,
                    change.status.as_str(),
                    change.weight,
                    change.picker_id,
                    change.picker_name,
                    now,
                ],
            )?;
            Ok(n > 0)
        })
    }

    pub fn set_deposit_photo(&self, id: &str, user_id: &str, path: &str) -> Result<bool> {
        let now = now_timestamp();
        self.with_conn(|conn| {
            let n = conn.execute(
                "UPDATE waste_deposits SET photo_proof = ?3, updated_at = ?4
                 WHERE id = ?1 AND user_id = ?2",
                rusqlite::params![id, user_id, path, now],
            )?;
            Ok(n > 0)
        })
    }
}

fn map_deposit(row: &Row<'_>) -> rusqlite::Result<DepositRow> {
    Ok(DepositRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        school_name: row.get(2)?,
        contact_name: row.get(3)?,
        contact_phone: row.get(4)?,
        address: row.get(5)?,
        pickup_date: row.get(6)?,
        bin_count: row.get(7)?,
        waste_type: row.get(8)?,
        photo_proof: row.get(9)?,
        weight: row.get(10)?,
        status: parse_col(row, 11)?,
        picker_id: row.get(12)?,
        picker_name: row.get(13)?,
        created_at: row.get(14)?,
        updated_at: row.get(15)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::test_support::seed_user;
    use sampah_types::models::Role;

    fn new_deposit<'a>(id: &'a str, user_id: &'a str) -> NewDeposit<'a> {
        NewDeposit {
            id,
            user_id,
            school_name: "SMP 3",
            contact_name: "Budi",
            contact_phone: "0812",
            address: "Jl. Merdeka 1",
            pickup_date: "2024-05-01",
            bin_count: 3,
            waste_type: "organic",
            photo_proof: None,
        }
    }

    #[test]
    fn inserted_deposit_is_pending_without_weight() {
        let db = Database::open_in_memory().unwrap();
        let user = seed_user(&db, "owner@school.id", Role::User);
        db.insert_deposit(&new_deposit("d1", &user)).unwrap();

        let row = db.get_deposit("d1").unwrap().unwrap();
        assert_eq!(row.status, DepositStatus::Pending);
        assert!(row.weight.is_none());
        assert_eq!(row.bin_count, 3);
        assert_eq!(row.pickup_date, "2024-05-01");
    }

    #[test]
    fn owner_scoping() {
        let db = Database::open_in_memory().unwrap();
        let owner = seed_user(&db, "owner@school.id", Role::User);
        let other = seed_user(&db, "other@school.id", Role::User);
        db.insert_deposit(&new_deposit("d1", &owner)).unwrap();

        assert!(db.get_owned_deposit("d1", &owner).unwrap().is_some());
        assert!(db.get_owned_deposit("d1", &other).unwrap().is_none());
        assert_eq!(db.list_deposits_for_user(&owner).unwrap().len(), 1);
        assert!(db.list_deposits_for_user(&other).unwrap().is_empty());

        assert!(!db.set_deposit_photo("d1", &other, "/uploads/x.jpg").unwrap());
        assert!(db.set_deposit_photo("d1", &owner, "/uploads/x.jpg").unwrap());
        let row = db.get_deposit("d1").unwrap().unwrap();
        assert_eq!(row.photo_proof.as_deref(), Some("/uploads/x.jpg"));
    }

    #[test]
    fn admin_listing_joins_owner() {
        let db = Database::open_in_memory().unwrap();
        let owner = seed_user(&db, "owner@school.id", Role::User);
        db.insert_deposit(&new_deposit("d1", &owner)).unwrap();
        db.insert_deposit(&new_deposit("d2", &owner)).unwrap();

        let all = db.list_all_deposits().unwrap();
        assert_eq!(all.len(), 2);
        // newest first
        assert_eq!(all[0].0.id, "d2");
        let joined = all[0].1.as_ref().unwrap();
        assert_eq!(joined.email, "owner@school.id");
    }

    #[test]
    fn change_is_applied_in_one_write() {
        let db = Database::open_in_memory().unwrap();
        let owner = seed_user(&db, "owner@school.id", Role::User);
        let admin = seed_user(&db, "admin@school.id", Role::Admin);
        db.insert_deposit(&new_deposit("d1", &owner)).unwrap();

        let applied = db
            .apply_deposit_change(
                "d1",
                &DepositChange {
                    status: DepositStatus::Proses,
                    weight: Some(12.5),
                    picker_id: Some(&admin),
                    picker_name: Some("Pak Admin"),
                },
            )
            .unwrap();
        assert!(applied);

        let row = db.get_deposit("d1").unwrap().unwrap();
        assert_eq!(row.status, DepositStatus::Proses);
        assert_eq!(row.weight, Some(12.5));
        assert_eq!(row.picker_id.as_deref(), Some(admin.as_str()));
        assert_eq!(row.picker_name.as_deref(), Some("Pak Admin"));

        let missing = db
            .apply_deposit_change(
                "nope",
                &DepositChange {
                    status: DepositStatus::Rejected,
                    weight: None,
                    picker_id: None,
                    picker_name: None,
                },
            )
            .unwrap();
        assert!(!missing);
    }
}
