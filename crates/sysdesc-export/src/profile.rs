//! AutoYaST profile (`autoinst.xml`) generation.
//!
//! Scopes are mapped to profile sections in a fixed order. The output is a
//! pure function of the description and options, byte for byte.

use crate::bundle::is_excluded;
use crate::{ExportError, ExportOptions};
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use sysdesc_schema::{Description, Element, Scope, ScopeKind, Value};

const YAST_NS: &str = "http://www.suse.com/1.0/yast2ns";
const CONFIG_NS: &str = "http://www.suse.com/1.0/configns";
const LIST: (&str, &str) = ("config:type", "list");
const BOOLEAN: (&str, &str) = ("config:type", "boolean");
const INTEGER: (&str, &str) = ("config:type", "integer");

/// Question shown by the installer when file content has to be fetched.
pub const URL_QUESTION: &str = "Enter URL to system description";
/// Where the installer stores the answer to [`URL_QUESTION`].
const URL_ANSWER_FILE: &str = "/tmp/description_url";

/// Scope kinds that contribute to the profile, in profile order.
pub const SUPPORTED_SCOPES: [&str; 9] = [
    ScopeKind::REPOSITORIES,
    ScopeKind::PACKAGES,
    ScopeKind::PATTERNS,
    ScopeKind::USERS,
    ScopeKind::GROUPS,
    ScopeKind::SERVICES,
    ScopeKind::CONFIG_FILES,
    ScopeKind::CHANGED_MANAGED_FILES,
    ScopeKind::UNMANAGED_FILES,
];

/// Thin wrapper over the quick-xml writer mapping its errors.
struct Xml {
    writer: Writer<Vec<u8>>,
}

impl Xml {
    fn new() -> Self {
        Self {
            writer: Writer::new_with_indent(Vec::new(), b' ', 2),
        }
    }

    fn event(&mut self, event: Event<'_>) -> Result<(), ExportError> {
        self.writer
            .write_event(event)
            .map_err(|e| ExportError::Xml(e.to_string()))
    }

    fn start(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<(), ExportError> {
        let mut start = BytesStart::new(name);
        for attr in attrs {
            start.push_attribute(*attr);
        }
        self.event(Event::Start(start))
    }

    fn end(&mut self, name: &str) -> Result<(), ExportError> {
        self.event(Event::End(BytesEnd::new(name)))
    }

    fn text(&mut self, name: &str, attrs: &[(&str, &str)], text: &str) -> Result<(), ExportError> {
        self.start(name, attrs)?;
        self.event(Event::Text(BytesText::new(text)))?;
        self.end(name)
    }

    fn cdata(&mut self, name: &str, text: &str) -> Result<(), ExportError> {
        self.start(name, &[])?;
        for section in BytesCData::escaped(text) {
            self.event(Event::CData(section))?;
        }
        self.end(name)
    }

    fn finish(self) -> Result<String, ExportError> {
        let mut out =
            String::from_utf8(self.writer.into_inner()).map_err(|e| ExportError::Xml(e.to_string()))?;
        out.push('\n');
        Ok(out)
    }
}

/// Write `<tag>value</tag>` when the element has `attr`.
fn optional(
    xml: &mut Xml,
    element: &Element,
    attr: &str,
    tag: &str,
    attrs: &[(&str, &str)],
) -> Result<(), ExportError> {
    match element.get(attr) {
        Some(value) if !value.is_null() => xml.text(tag, attrs, &value.to_string()),
        _ => Ok(()),
    }
}

/// Quote a string for a POSIX shell.
fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}

/// Builds the AutoYaST profile for one description.
pub struct ProfileBuilder<'a> {
    description: &'a Description,
    options: &'a ExportOptions,
    excludes: Vec<String>,
}

impl<'a> ProfileBuilder<'a> {
    pub fn new(description: &'a Description, options: &'a ExportOptions) -> Self {
        Self {
            description,
            options,
            excludes: options.excludes(),
        }
    }

    /// File scopes whose content was extracted, in profile order.
    pub fn extracted_file_scopes(&self) -> Vec<&'a Scope> {
        ScopeKind::FILE_SCOPES
            .iter()
            .filter_map(|kind| self.description.scope(kind))
            .filter(|scope| scope.is_extracted())
            .collect()
    }

    pub fn build(&self) -> Result<String, ExportError> {
        for kind in self.description.kinds() {
            if !SUPPORTED_SCOPES.iter().any(|k| *k == kind.as_str()) {
                tracing::warn!("skipping scope '{kind}': not supported by the AutoYaST profile");
            }
        }

        let mut xml = Xml::new();
        xml.event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        xml.start("profile", &[("xmlns", YAST_NS), ("xmlns:config", CONFIG_NS)])?;

        self.general(&mut xml)?;
        self.repositories(&mut xml)?;
        self.software(&mut xml)?;
        self.users(&mut xml)?;
        self.groups(&mut xml)?;
        self.services(&mut xml)?;

        let extracted = self.extracted_file_scopes();
        if !extracted.is_empty() {
            self.ask_for_url(&mut xml)?;
            self.file_scripts(&mut xml, &extracted)?;
        }

        xml.end("profile")?;
        xml.finish()
    }

    fn general(&self, xml: &mut Xml) -> Result<(), ExportError> {
        xml.start("general", &[])?;
        xml.start("mode", &[])?;
        xml.text("confirm", &[BOOLEAN], "false")?;
        xml.end("mode")?;
        xml.end("general")
    }

    fn repositories(&self, xml: &mut Xml) -> Result<(), ExportError> {
        let Some(scope) = self.description.scope(ScopeKind::REPOSITORIES) else {
            return Ok(());
        };
        xml.start("add-on", &[])?;
        xml.start("add_on_products", &[LIST])?;
        for repo in scope.elements() {
            if repo.get("enabled").and_then(Value::as_bool) == Some(false) {
                tracing::debug!("repository '{}' is disabled, not added", repo.name());
                continue;
            }
            let Some(url) = repo.get_str("url") else {
                tracing::debug!("repository '{}' has no url, not added", repo.name());
                continue;
            };
            xml.start("listentry", &[])?;
            xml.text("media_url", &[], url)?;
            xml.text("product", &[], repo.name())?;
            optional(xml, repo, "alias", "alias", &[])?;
            optional(xml, repo, "priority", "priority", &[INTEGER])?;
            xml.end("listentry")?;
        }
        xml.end("add_on_products")?;
        xml.end("add-on")
    }

    fn software(&self, xml: &mut Xml) -> Result<(), ExportError> {
        let packages = self.description.scope(ScopeKind::PACKAGES);
        let patterns = self.description.scope(ScopeKind::PATTERNS);
        if packages.is_none() && patterns.is_none() {
            return Ok(());
        }
        xml.start("software", &[])?;
        if let Some(scope) = packages {
            xml.start("packages", &[LIST])?;
            for package in scope.elements() {
                xml.text("package", &[], package.name())?;
            }
            xml.end("packages")?;
        }
        if let Some(scope) = patterns {
            xml.start("patterns", &[LIST])?;
            for pattern in scope.elements() {
                xml.text("pattern", &[], pattern.name())?;
            }
            xml.end("patterns")?;
        }
        xml.end("software")
    }

    fn users(&self, xml: &mut Xml) -> Result<(), ExportError> {
        let Some(scope) = self.description.scope(ScopeKind::USERS) else {
            return Ok(());
        };
        xml.start("users", &[LIST])?;
        for user in scope.elements() {
            xml.start("user", &[])?;
            xml.text("username", &[], user.name())?;
            if user.get("encrypted_password").is_some_and(|v| !v.is_null()) {
                optional(xml, user, "encrypted_password", "user_password", &[])?;
                xml.text("encrypted", &[BOOLEAN], "true")?;
            }
            optional(xml, user, "uid", "uid", &[])?;
            optional(xml, user, "gid", "gid", &[])?;
            optional(xml, user, "home", "home", &[])?;
            optional(xml, user, "shell", "shell", &[])?;
            optional(xml, user, "comment", "fullname", &[])?;

            let settings = [
                ("min_days", "min"),
                ("max_days", "max"),
                ("warn_days", "warn"),
                ("disable_days", "inact"),
                ("disabled_date", "expire"),
            ];
            if settings.iter().any(|(attr, _)| user.get(attr).is_some()) {
                xml.start("password_settings", &[])?;
                for (attr, tag) in settings {
                    optional(xml, user, attr, tag, &[])?;
                }
                xml.end("password_settings")?;
            }
            xml.end("user")?;
        }
        xml.end("users")
    }

    fn groups(&self, xml: &mut Xml) -> Result<(), ExportError> {
        let Some(scope) = self.description.scope(ScopeKind::GROUPS) else {
            return Ok(());
        };
        xml.start("groups", &[LIST])?;
        for group in scope.elements() {
            xml.start("group", &[])?;
            xml.text("encrypted", &[BOOLEAN], "true")?;
            optional(xml, group, "gid", "gid", &[])?;
            optional(xml, group, "password", "group_password", &[])?;
            xml.text("groupname", &[], group.name())?;
            let users = group
                .get("users")
                .and_then(Value::as_list)
                .map(|users| users.iter().map(ToString::to_string).collect::<Vec<_>>().join(","))
                .unwrap_or_default();
            xml.text("userlist", &[], &users)?;
            xml.end("group")?;
        }
        xml.end("groups")
    }

    /// Service names to enable and disable. With systemd only `.service`
    /// units are considered, named without the suffix; states other than
    /// `enabled` and `disabled` have no AutoYaST equivalent.
    fn service_states(scope: &Scope) -> (Vec<&str>, Vec<&str>) {
        let systemd = scope.attribute_str("init_system") == Some("systemd");
        let mut enable = Vec::new();
        let mut disable = Vec::new();
        for service in scope.elements() {
            let name = if systemd {
                match service.name().strip_suffix(".service") {
                    Some(unit) => unit,
                    None => continue,
                }
            } else {
                service.name()
            };
            match service.get_str("state") {
                Some("enabled") => enable.push(name),
                Some("disabled") => disable.push(name),
                _ => {}
            }
        }
        (enable, disable)
    }

    fn services(&self, xml: &mut Xml) -> Result<(), ExportError> {
        let Some(scope) = self.description.scope(ScopeKind::SERVICES) else {
            return Ok(());
        };
        let (enable, disable) = Self::service_states(scope);
        xml.start("services-manager", &[])?;
        xml.start("services", &[])?;
        xml.start("enable", &[LIST])?;
        for name in enable {
            xml.text("service", &[], name)?;
        }
        xml.end("enable")?;
        xml.start("disable", &[LIST])?;
        for name in disable {
            xml.text("service", &[], name)?;
        }
        xml.end("disable")?;
        xml.end("services")?;
        xml.end("services-manager")
    }

    fn ask_for_url(&self, xml: &mut Xml) -> Result<(), ExportError> {
        xml.start("ask-list", &[LIST])?;
        xml.start("ask", &[])?;
        xml.text("question", &[], URL_QUESTION)?;
        if let Some(url) = &self.options.description_url {
            xml.text("default", &[], url)?;
        }
        xml.text(
            "help",
            &[],
            "Files of the system description are fetched from this URL. \
             It must point to the exported directory containing autoinst.xml.",
        )?;
        xml.text("file", &[], URL_ANSWER_FILE)?;
        xml.text("stage", &[], "initial")?;
        xml.end("ask")?;
        xml.end("ask-list")
    }

    fn file_scripts(&self, xml: &mut Xml, extracted: &[&Scope]) -> Result<(), ExportError> {
        xml.start("scripts", &[])?;
        xml.start("chroot-scripts", &[LIST])?;
        for scope in extracted {
            xml.start("script", &[])?;
            xml.text("filename", &[], &format!("{}.sh", scope.kind()))?;
            xml.text("chrooted", &[BOOLEAN], "false")?;
            xml.cdata("source", &self.restore_script(scope))?;
            xml.end("script")?;
        }
        xml.end("chroot-scripts")?;
        xml.end("scripts")
    }

    /// Shell script restoring the files of one extracted scope into `/mnt`.
    fn restore_script(&self, scope: &Scope) -> String {
        let kind = scope.kind();
        let mut script = format!("url=$(cat {URL_ANSWER_FILE})\n");
        for file in scope.elements() {
            let path = file.name();
            if is_excluded(path, &self.excludes) {
                continue;
            }
            let target = shell_quote(&format!("/mnt{path}"));
            let deleted = file
                .get("changes")
                .and_then(Value::as_list)
                .is_some_and(|c| c.iter().any(|v| v.as_str() == Some("deleted")));
            if deleted {
                script.push_str(&format!("rm -rf {target}\n"));
                continue;
            }
            match file.get_str("type") {
                Some("dir") => {
                    script.push_str(&format!("mkdir -p {target}\n"));
                }
                Some("link") => {
                    if let Some(link) = file.get_str("target") {
                        script.push_str(&format!("ln -sfn {} {target}\n", shell_quote(link)));
                    }
                }
                _ => {
                    script.push_str(&format!(
                        "curl -s -f --create-dirs -o {target} \"$url\"/{}\n",
                        shell_quote(&format!("{kind}{path}"))
                    ));
                }
            }
            if let Some(mode) = file.get_str("mode") {
                script.push_str(&format!("chmod {} {target}\n", shell_quote(mode)));
            }
            if let (Some(user), Some(group)) = (file.get_str("user"), file.get_str("group")) {
                let owner = shell_quote(&format!("{user}:{group}"));
                script.push_str(&format!("chown -h {owner} {target}\n"));
            }
        }
        script
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn description(json: &str) -> Description {
        Description::from_json("web01", json).unwrap()
    }

    fn build(d: &Description) -> String {
        ProfileBuilder::new(d, &ExportOptions::default())
            .build()
            .unwrap()
    }

    #[test]
    fn minimal_profile_layout() {
        let d = Description::new("empty");
        assert_eq!(
            build(&d),
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
             <profile xmlns=\"http://www.suse.com/1.0/yast2ns\" xmlns:config=\"http://www.suse.com/1.0/configns\">\n\
             \x20 <general>\n\
             \x20   <mode>\n\
             \x20     <confirm config:type=\"boolean\">false</confirm>\n\
             \x20   </mode>\n\
             \x20 </general>\n\
             </profile>\n"
        );
    }

    #[test]
    fn systemd_services_are_split_by_state() {
        let d = description(
            r#"{"format_version": 1, "scopes": {"services": {
                "kind": "services",
                "attributes": {"init_system": "systemd"},
                "elements": [
                    {"name": "sshd.service", "state": "enabled"},
                    {"name": "cups.service", "state": "disabled"},
                    {"name": "getty@.service", "state": "indirect"},
                    {"name": "cups.socket", "state": "enabled"}
                ]}}}"#,
        );
        let profile = build(&d);
        assert!(profile.contains(
            "<enable config:type=\"list\">\n        <service>sshd</service>\n      </enable>"
        ));
        assert!(profile.contains("<service>cups</service>"));
        assert!(!profile.contains("getty"));
        assert!(!profile.contains("cups.socket"));
    }

    #[test]
    fn sysvinit_services_keep_their_names() {
        let d = description(
            r#"{"format_version": 1, "scopes": {"services": {
                "kind": "services",
                "attributes": {"init_system": "sysvinit"},
                "elements": [{"name": "sshd", "state": "enabled"}]}}}"#,
        );
        assert!(build(&d).contains("<service>sshd</service>"));
    }

    #[test]
    fn repositories_skip_disabled_entries() {
        let d = description(
            r#"{"format_version": 1, "scopes": {"repositories": {
                "kind": "repositories",
                "elements": [
                    {"name": "oss", "alias": "repo-oss", "url": "http://example.com/oss", "enabled": true, "priority": 99},
                    {"name": "debug", "url": "http://example.com/debug", "enabled": false},
                    {"name": "dvd", "enabled": true}
                ]}}}"#,
        );
        let profile = build(&d);
        assert!(profile.contains("<media_url>http://example.com/oss</media_url>"));
        assert!(profile.contains("<alias>repo-oss</alias>"));
        assert!(profile.contains("<priority config:type=\"integer\">99</priority>"));
        assert!(!profile.contains("debug"));
        assert!(!profile.contains("<product>dvd</product>"));
    }

    #[test]
    fn users_and_groups() {
        let d = description(
            r#"{"format_version": 1, "scopes": {
                "users": {"kind": "users", "elements": [
                    {"name": "alice", "uid": 1000, "gid": 100, "home": "/home/alice",
                     "shell": "/bin/bash", "comment": "Alice & Co",
                     "encrypted_password": "$6$abc", "max_days": 99999}
                ]},
                "groups": {"kind": "groups", "elements": [
                    {"name": "wheel", "gid": 10, "users": ["alice", "bob"]}
                ]}}}"#,
        );
        let profile = build(&d);
        assert!(profile.contains("<username>alice</username>"));
        assert!(profile.contains("<user_password>$6$abc</user_password>"));
        assert!(profile.contains("<fullname>Alice &amp; Co</fullname>"));
        assert!(profile.contains("<max>99999</max>"));
        assert!(!profile.contains("<min>"));
        assert!(profile.contains("<groupname>wheel</groupname>"));
        assert!(profile.contains("<userlist>alice,bob</userlist>"));
    }

    #[test]
    fn software_section_lists_packages_and_patterns() {
        let d = description(
            r#"{"format_version": 1, "scopes": {
                "packages": {"kind": "packages", "elements": [{"name": "bash"}, {"name": "vim"}]},
                "patterns": {"kind": "patterns", "elements": [{"name": "base"}]}}}"#,
        );
        let profile = build(&d);
        assert!(profile.contains("<package>bash</package>"));
        assert!(profile.contains("<package>vim</package>"));
        assert!(profile.contains("<pattern>base</pattern>"));
        assert!(profile.find("<package>bash").unwrap() < profile.find("<package>vim").unwrap());
    }

    #[test]
    fn no_url_prompt_without_extracted_files() {
        let d = description(
            r#"{"format_version": 1, "scopes": {
                "config_files": {"kind": "config_files", "extracted": false,
                    "elements": [{"name": "/etc/hosts", "changes": ["md5"]}]},
                "unmanaged_files": {"kind": "unmanaged_files", "extracted": false,
                    "elements": [{"name": "/srv/data", "type": "file"}]}}}"#,
        );
        let profile = build(&d);
        assert!(!profile.contains(URL_QUESTION));
        assert!(!profile.contains("ask-list"));
        assert!(!profile.contains("chroot-scripts"));
    }

    #[test]
    fn extracted_files_get_prompt_and_restore_script() {
        let d = description(
            r#"{"format_version": 1, "scopes": {
                "config_files": {"kind": "config_files", "extracted": true, "elements": [
                    {"name": "/etc/hosts", "changes": ["md5"], "mode": "644", "user": "root", "group": "root"},
                    {"name": "/etc/passwd", "changes": ["md5"]}
                ]},
                "changed_managed_files": {"kind": "changed_managed_files", "extracted": true, "elements": [
                    {"name": "/usr/share/gone", "changes": ["deleted"]}
                ]},
                "unmanaged_files": {"kind": "unmanaged_files", "extracted": false,
                    "elements": [{"name": "/srv/data", "type": "file"}]}}}"#,
        );
        let options = ExportOptions {
            description_url: Some("http://10.0.0.1/web01".to_owned()),
            extra_excludes: Vec::new(),
        };
        let profile = ProfileBuilder::new(&d, &options).build().unwrap();
        assert!(profile.contains(URL_QUESTION));
        assert!(profile.contains("<default>http://10.0.0.1/web01</default>"));
        assert!(profile.contains("<filename>config_files.sh</filename>"));
        assert!(profile.contains("<filename>changed_managed_files.sh</filename>"));
        assert!(!profile.contains("unmanaged_files.sh"));
        assert!(profile.contains(
            "curl -s -f --create-dirs -o '/mnt/etc/hosts' \"$url\"/'config_files/etc/hosts'"
        ));
        assert!(profile.contains("chmod '644' '/mnt/etc/hosts'"));
        assert!(profile.contains("chown -h 'root:root' '/mnt/etc/hosts'"));
        assert!(profile.contains("rm -rf '/mnt/usr/share/gone'"));
        assert!(!profile.contains("/etc/passwd"));
    }

    #[test]
    fn unknown_scopes_are_skipped() {
        let with_unknown = description(
            r#"{"format_version": 1, "scopes": {
                "kernel_modules": {"kind": "kernel_modules", "elements": [{"name": "kvm"}]}}}"#,
        );
        assert_eq!(build(&with_unknown), build(&Description::new("empty")));
    }

    #[test]
    fn profile_is_deterministic() {
        let json = r#"{"format_version": 1, "scopes": {
            "packages": {"kind": "packages", "elements": [{"name": "bash"}]},
            "services": {"kind": "services", "elements": [{"name": "sshd", "state": "enabled"}]}}}"#;
        assert_eq!(build(&description(json)), build(&description(json)));
    }

    #[test]
    fn shell_quote_escapes_single_quotes() {
        assert_eq!(shell_quote("/etc/it's"), r"'/etc/it'\''s'");
    }

    #[test]
    fn ownership_and_mode_are_quoted_in_restore_script() {
        let d = description(
            r#"{"format_version": 1, "scopes": {
                "config_files": {"kind": "config_files", "extracted": true, "elements": [
                    {"name": "/etc/hosts", "changes": ["md5"],
                     "mode": "644 /; touch /mnt/pwned", "user": "root;reboot", "group": "root"}
                ]}}}"#,
        );
        let profile = build(&d);
        assert!(profile.contains("chmod '644 /; touch /mnt/pwned' '/mnt/etc/hosts'"));
        assert!(profile.contains("chown -h 'root;reboot:root' '/mnt/etc/hosts'"));
        assert!(!profile.contains("chmod 644 /;"));
    }

    /// Concatenated CDATA content of every `<source>` element.
    fn script_sources(profile: &str) -> String {
        use quick_xml::Reader;

        let mut reader = Reader::from_str(profile);
        let mut sources = String::new();
        loop {
            match reader.read_event() {
                Ok(Event::CData(e)) => sources.push_str(std::str::from_utf8(&e).unwrap()),
                Ok(Event::Eof) => break,
                Ok(_) => {}
                Err(e) => panic!("profile is not well-formed: {e}"),
            }
        }
        sources
    }

    #[test]
    fn cdata_terminator_in_file_name_keeps_profile_well_formed() {
        let d = description(
            r#"{"format_version": 1, "scopes": {
                "config_files": {"kind": "config_files", "extracted": true, "elements": [
                    {"name": "/etc/a]]>b", "changes": ["md5"]}
                ]}}}"#,
        );
        let profile = build(&d);
        let options = ExportOptions::default();
        let builder = ProfileBuilder::new(&d, &options);
        let scope = d.scope("config_files").unwrap();
        let script = builder.restore_script(scope);
        assert!(script.contains("'/mnt/etc/a]]>b'"));
        assert_eq!(script_sources(&profile), script);
        assert_eq!(
            profile.matches("<![CDATA[").count(),
            script.matches("]]>").count() + 1
        );
    }

    #[test]
    fn null_encrypted_password_emits_no_password_block() {
        let d = description(
            r#"{"format_version": 1, "scopes": {
                "users": {"kind": "users", "elements": [
                    {"name": "nobody", "uid": 65534, "encrypted_password": null}
                ]}}}"#,
        );
        let profile = build(&d);
        assert!(profile.contains("<username>nobody</username>"));
        assert!(!profile.contains("<encrypted"));
        assert!(!profile.contains("<user_password>"));
    }
}
