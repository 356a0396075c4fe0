use anyhow::Result;
use chrono::NaiveDate;
use rusqlite::{params, OptionalExtension};

use crate::db::{
    connection::Database,
    helpers::{date_to_sql, parse_date},
    models::DailyMemo,
};

impl Database {
    pub async fn get_memos_between(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<DailyMemo>> {
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT memo_date, content FROM daily_memos
                 WHERE memo_date BETWEEN ?1 AND ?2
                 ORDER BY memo_date ASC",
            )?;

            let mut rows = stmt.query(params![date_to_sql(from), date_to_sql(to)])?;
            let mut memos = Vec::new();
            while let Some(row) = rows.next()? {
                let memo_date: String = row.get(0)?;
                memos.push(DailyMemo {
                    memo_date: parse_date(&memo_date, "memo_date")?,
                    content: row.get(1)?,
                });
            }

            Ok(memos)
        })
        .await
    }

    pub async fn get_memo_row(&self, memo_date: NaiveDate) -> Result<Option<DailyMemo>> {
        self.execute(move |conn| {
            let content: Option<String> = conn
                .query_row(
                    "SELECT content FROM daily_memos WHERE memo_date = ?1",
                    params![date_to_sql(memo_date)],
                    |row| row.get(0),
                )
                .optional()?;

            Ok(content.map(|content| DailyMemo { memo_date, content }))
        })
        .await
    }

    pub async fn upsert_memo_row(&self, memo_date: NaiveDate, content: String) -> Result<DailyMemo> {
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO daily_memos (memo_date, content) VALUES (?1, ?2)
                 ON CONFLICT(memo_date) DO UPDATE SET content = excluded.content",
                params![date_to_sql(memo_date), content],
            )?;
            Ok(DailyMemo { memo_date, content })
        })
        .await
    }

    /// Deleting a day without a memo is not an error.
    pub async fn delete_memo_row(&self, memo_date: NaiveDate) -> Result<()> {
        self.execute(move |conn| {
            conn.execute(
                "DELETE FROM daily_memos WHERE memo_date = ?1",
                params![date_to_sql(memo_date)],
            )?;
            Ok(())
        })
        .await
    }
}
