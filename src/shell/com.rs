//! Windows shell namespace over COM.
//!
//! Enumeration goes through `IShellFolder`, so virtual folders such as an
//! attached iPhone ("This PC\Apple iPhone\Internal Storage") work the same as
//! drives. Copies go through `IFileOperation`, i.e. the Explorer copy engine.

use std::ffi::c_void;
use std::path::Path;
use tracing::debug;
use windows::core::{IUnknown, HSTRING, PWSTR};
use windows::Win32::Foundation::{HWND, S_OK};
use windows::Win32::System::Com::{
    CoCreateInstance, CoInitializeEx, CoTaskMemFree, CoUninitialize, IBindCtx, CLSCTX_ALL,
    COINIT_APARTMENTTHREADED,
};
use windows::Win32::System::SystemServices::{SFGAO_FOLDER, SFGAO_STREAM};
use windows::Win32::UI::Shell::Common::{ITEMIDLIST, STRRET};
use windows::Win32::UI::Shell::{
    FileOperation, IEnumIDList, IFileOperation, IFileOperationProgressSink, IShellFolder,
    IShellItem, ILFree, SHCreateItemFromIDList, SHCreateItemFromParsingName,
    SHCreateItemWithParent, SHGetDesktopFolder, SHGetIDListFromObject, StrRetToStrW,
    SHCONTF_FOLDERS, SHCONTF_NONFOLDERS, SHGDN_NORMAL, SIGDN_DESKTOPABSOLUTEEDITING,
};

use super::{CopyRequest, Entry, Namespace};
use crate::errors::NamespaceError;

/// Keeps COM initialised (single-threaded apartment) for the namespace's lifetime.
struct ComApartment;

impl ComApartment {
    fn enter() -> Result<Self, NamespaceError> {
        unsafe { CoInitializeEx(None, COINIT_APARTMENTTHREADED).ok()? };
        Ok(Self)
    }
}

impl Drop for ComApartment {
    fn drop(&mut self) {
        unsafe { CoUninitialize() };
    }
}

pub struct ShellNamespace {
    _com: ComApartment,
}

impl ShellNamespace {
    pub fn new() -> Result<Self, NamespaceError> {
        Ok(Self {
            _com: ComApartment::enter()?,
        })
    }
}

unsafe fn take_string(p: PWSTR) -> Result<String, NamespaceError> {
    let s = p
        .to_string()
        .map_err(|e| NamespaceError::Shell(e.to_string()));
    CoTaskMemFree(Some(p.0 as *const c_void));
    s
}

fn shell_item_path(item: &IShellItem) -> Result<String, NamespaceError> {
    unsafe { take_string(item.GetDisplayName(SIGDN_DESKTOPABSOLUTEEDITING)?) }
}

/// Owned child id from `IEnumIDList::Next`.
struct ChildId(*mut ITEMIDLIST);

impl Drop for ChildId {
    fn drop(&mut self) {
        unsafe { ILFree(Some(self.0 as *const ITEMIDLIST)) };
    }
}

fn next_child(list: &IEnumIDList) -> Result<Option<ChildId>, NamespaceError> {
    let mut ids = [std::ptr::null_mut(); 1];
    let mut fetched = 0u32;
    let hr = unsafe { list.Next(&mut ids, Some(&mut fetched)) };
    hr.ok()?;
    if hr != S_OK || fetched == 0 {
        return Ok(None);
    }
    Ok(Some(ChildId(ids[0])))
}

fn display_name(folder: &IShellFolder, child: &ChildId) -> Result<String, NamespaceError> {
    let mut strret = STRRET::default();
    unsafe {
        folder.GetDisplayNameOf(child.0, SHGDN_NORMAL, &mut strret)?;
        let mut name = PWSTR::null();
        StrRetToStrW(&mut strret, Some(child.0), &mut name)?;
        take_string(name)
    }
}

fn is_folder(folder: &IShellFolder, child: &ChildId) -> Result<bool, NamespaceError> {
    // Zip archives report SFGAO_FOLDER too; they are copied as files.
    let mut attributes = SFGAO_FOLDER.0 | SFGAO_STREAM.0;
    unsafe { folder.GetAttributesOf(&[child.0 as *const ITEMIDLIST], &mut attributes)? };
    Ok(attributes & SFGAO_FOLDER.0 != 0 && attributes & SFGAO_STREAM.0 == 0)
}

/// `None` when the folder is empty (S_FALSE without a list).
fn enumerate(folder: &IShellFolder, flags: u32) -> Result<Option<IEnumIDList>, NamespaceError> {
    let mut list: Option<IEnumIDList> = None;
    unsafe { folder.EnumObjects(HWND::default(), flags, &mut list).ok()? };
    Ok(list)
}

impl Namespace for ShellNamespace {
    type Folder = IShellFolder;
    type Item = IShellItem;
    type Destination = IShellItem;

    fn root(&self) -> Result<IShellFolder, NamespaceError> {
        Ok(unsafe { SHGetDesktopFolder()? })
    }

    fn children(
        &self,
        folder: &IShellFolder,
    ) -> Result<Vec<Entry<IShellFolder, IShellItem>>, NamespaceError> {
        let flags = (SHCONTF_FOLDERS.0 | SHCONTF_NONFOLDERS.0) as u32;
        let Some(list) = enumerate(folder, flags)? else {
            return Ok(Vec::new());
        };

        let mut named = Vec::new();
        while let Some(child) = next_child(&list)? {
            let name = display_name(folder, &child)?;
            let entry = if is_folder(folder, &child)? {
                let sub: IShellFolder =
                    unsafe { folder.BindToObject(child.0, None::<&IBindCtx>)? };
                Entry::Folder {
                    name: name.clone(),
                    folder: sub,
                }
            } else {
                let item: IShellItem = unsafe { SHCreateItemWithParent(None, folder, child.0)? };
                Entry::File(item)
            };
            named.push((name, entry));
        }

        named.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(named.into_iter().map(|(_, entry)| entry).collect())
    }

    /// Only the matching child is bound, so siblings that cannot be opened
    /// do not get in the way.
    fn child_folder(
        &self,
        folder: &IShellFolder,
        name: &str,
    ) -> Result<Option<IShellFolder>, NamespaceError> {
        let Some(list) = enumerate(folder, SHCONTF_FOLDERS.0 as u32)? else {
            return Ok(None);
        };
        while let Some(child) = next_child(&list)? {
            if display_name(folder, &child)? == name && is_folder(folder, &child)? {
                let sub: IShellFolder =
                    unsafe { folder.BindToObject(child.0, None::<&IBindCtx>)? };
                return Ok(Some(sub));
            }
        }
        Ok(None)
    }

    fn folder_path(&self, folder: &IShellFolder) -> Result<String, NamespaceError> {
        unsafe {
            let id = SHGetIDListFromObject(folder)?;
            let item: Result<IShellItem, _> = SHCreateItemFromIDList(id);
            ILFree(Some(id as *const ITEMIDLIST));
            shell_item_path(&item?)
        }
    }

    fn item_path(&self, item: &IShellItem) -> Result<String, NamespaceError> {
        shell_item_path(item)
    }

    fn resolve_destination(&self, dir: &Path) -> Result<IShellItem, NamespaceError> {
        let name = HSTRING::from(dir.as_os_str());
        unsafe { SHCreateItemFromParsingName(&name, None::<&IBindCtx>) }
            .map_err(|_| NamespaceError::DestinationNotFound(dir.display().to_string()))
    }

    fn copy_batch(&self, requests: &[CopyRequest<'_, Self>]) -> Result<(), NamespaceError> {
        unsafe {
            let operation: IFileOperation =
                CoCreateInstance(&FileOperation, None::<&IUnknown>, CLSCTX_ALL)?;
            for request in requests {
                debug!(
                    "Queuing copy of '{}' to '{}'",
                    shell_item_path(request.item)?,
                    shell_item_path(request.destination)?
                );
                operation.CopyItem(
                    request.item,
                    request.destination,
                    &HSTRING::from(request.name),
                    None::<&IFileOperationProgressSink>,
                )?;
            }
            operation.PerformOperations()?;
            if operation.GetAnyOperationsAborted()?.as_bool() {
                return Err(NamespaceError::Aborted);
            }
        }
        Ok(())
    }
}
